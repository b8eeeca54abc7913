use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use scenario_report::{quantity_as_array, FileScenario, Key, QuantityKind};

#[derive(Parser, Debug)]
#[command(name = "scenario-report")]
#[command(about = "Show a scenario quantity as labeled arrays, optionally with all its aggregates")]
struct Args {
    /// Scenario directory (one `par/`, `equ/`, `var/` subdirectory per kind)
    scenario_dir: PathBuf,

    /// Quantity name; omit to list the available quantities
    quantity: Option<String>,

    /// Kind of quantity: par, equ or var
    #[arg(long, default_value = "par")]
    kind: QuantityKind,

    /// Also print every aggregation of the quantity
    #[arg(long)]
    aggregates: bool,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e:#}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let scenario = FileScenario::new(&args.scenario_dir);

    let Some(name) = &args.quantity else {
        for kind in QuantityKind::ALL {
            for name in scenario.list(kind)? {
                println!("{kind}\t{name}");
            }
        }
        return Ok(());
    };

    let arrays = quantity_as_array(&scenario, name, args.kind)
        .with_context(|| format!("reading {} '{name}'", args.kind))?;
    for (column, array) in &arrays {
        println!("[{column}]");
        println!("{array}");
    }

    if args.aggregates {
        let column = args.kind.value_columns()[0];
        let array = arrays
            .get(column)
            .with_context(|| format!("no '{column}' column"))?;
        let key = Key::new(name.as_str(), array.dims().iter().cloned())?;
        for (agg_key, task) in key.aggregates() {
            println!("{agg_key} = {task}");
            println!("{}", task.apply(array)?);
        }
    }

    Ok(())
}
