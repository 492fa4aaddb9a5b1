use std::path::Path;

use anyhow::Result;
use assert_cost_core::panics::tally;

use super::render::render_json;
use super::util::read_text;

/// Count `call to <function> may panic` lines in a verifier log.
pub fn panics_command(log: &Path, json: bool) -> Result<()> {
    let tally = tally(&read_text(log)?);

    if json {
        println!("{}", render_json(&tally)?);
        return Ok(());
    }

    println!("Unique functions that may panic: {}", tally.unique_functions());
    println!("Total panic sites: {}", tally.total());
    for site in &tally.sites {
        println!("  {:>4}  {}", site.count, site.function);
    }
    Ok(())
}
