use crate::build;
use crate::cli::{project_root, DefinesArgs};
use crate::core::config::Config;
use crate::core::error::Result;

/// Run the defines command
pub fn run(args: DefinesArgs) -> Result<()> {
    let root = project_root(args.root)?;
    let config = Config::load(&root)?;
    let defines = build::harvest(&root, &config.build)?;

    if args.json {
        let names: Vec<&str> = defines.iter().collect();
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if defines.is_empty() {
        println!("No defines found");
        return Ok(());
    }
    for flag in defines.flags() {
        println!("{}", flag);
    }
    Ok(())
}
