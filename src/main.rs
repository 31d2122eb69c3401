use anyhow::Context;

fn main() -> anyhow::Result<()> {
    sshca::run().context("sshca failed")
}
