use runsweep::app;
use std::time::Instant;

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = app::run_cli(args)?;
    println!("{output}");
    Ok(())
}

fn main() {
    let start = Instant::now();
    let result = run();
    eprintln!("finished in {:.2?}", start.elapsed());
    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
