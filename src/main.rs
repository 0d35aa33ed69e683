use anyhow::Result;

fn main() -> Result<()> {
    topbot::cli::run()
}
