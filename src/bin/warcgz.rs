use std::env::args;
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use warcgz::analyzer;
use warcgz::warc;

fn main() -> io::Result<()>
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    for filename in args().skip(1)
    {
        let report = analyzer::analyze(Path::new(&filename))?;
        println!("{}", filename);
        println!("{}", report);
        println!("{}", report.recommendation());
        for member in report.members()
        {
            if member.snippet.starts_with(b"WARC/")
            {
                println!(
                    "{} warc_record_length_ok={}",
                    member,
                    warc::record_length_matches(member)
                );
            }
            else
            {
                println!("{}", member);
            }
        }
    }
    Ok(())
}
