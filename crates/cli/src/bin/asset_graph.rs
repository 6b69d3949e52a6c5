use anyhow::Result;

fn main() -> Result<()> {
    asset_cli::main_entry()
}
