use monfg_nash::cli;

fn main() {
    cli::run();
}
