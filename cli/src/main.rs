use anyhow::Result;

fn main() -> Result<()> {
    son_cli::run()
}
