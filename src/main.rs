use accidents_sql::{
    cli::{Cli, Commands},
    config::Config,
    download::install_airports_database,
    filter::resolve_steps,
    logging::init_logging,
    orchestrator::{run_steps, SuiteRunner},
    pipeline::{Pipeline, Step, StepReport},
    schema::table_listing,
    ui::{ConsoleUi, Ui, UiApp},
    writer::load_sql_files,
};
use anyhow::Result;
use std::sync::mpsc;
use std::time::Instant;

/// Optional airport download, then the selected steps
fn run_pipeline(
    config: Config,
    steps: &[Step],
    fetch_airports: bool,
    ui: &mut impl Ui,
) -> Result<Vec<StepReport>> {
    if fetch_airports {
        install_airports_database(&config.airports_database(), None, false, ui)?;
    }

    let mut pipeline = Pipeline::new(config);
    run_steps(&mut pipeline, steps, ui)
}

fn summarize(reports: &[StepReport], elapsed: f64) -> String {
    let rows: usize = reports.iter().map(StepReport::total_rows).sum();
    format!(
        "{} steps, {} rows written in {:.1}s",
        reports.len(),
        rows,
        elapsed
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load(cli.config.as_deref())?;

    let tui = matches!(cli.command, Commands::Run { tui: true, .. });
    let (warnings_tx, warnings_rx) = mpsc::channel();
    let _guard = init_logging(&config.logs_dir(), !tui, tui.then_some(warnings_tx))?;

    match cli.command {
        Commands::Run {
            include,
            exclude,
            tui,
            fetch_airports,
        } => {
            let start = Instant::now();
            let steps = resolve_steps(include, exclude)?;

            if tui {
                let mut ui = UiApp::new()?.with_warnings(warnings_rx);
                match run_pipeline(config, &steps, fetch_airports, &mut ui) {
                    Ok(reports) => {
                        ui.finish(&summarize(&reports, start.elapsed().as_secs_f64()))?;
                    }
                    Err(e) => {
                        ui.restore()?;
                        return Err(e);
                    }
                }
            } else {
                let reports =
                    run_pipeline(config, &steps, fetch_airports, &mut ConsoleUi::new())?;
                for report in &reports {
                    println!("{}", report.summary());
                }
                println!("\n{}", summarize(&reports, start.elapsed().as_secs_f64()));
            }
        }

        Commands::Generate { step } => {
            let step: Step = step.parse()?;
            let mut pipeline = Pipeline::new(config);
            let report = pipeline.run_step(step, &mut ConsoleUi::new())?;
            println!("{}", report.summary());
        }

        Commands::Suite => {
            let start = Instant::now();
            SuiteRunner::new(cli.config.clone())?.run(&Step::ALL)?;
            println!("Suite finished in {:.1}s", start.elapsed().as_secs_f64());
        }

        Commands::Load {
            output_db,
            input_dir,
        } => {
            let start = Instant::now();
            let rows =
                load_sql_files(&output_db, &config, input_dir.as_deref(), &mut ConsoleUi::new())?;
            println!(
                "Created {:?} ({} rows) in {:.1}s",
                output_db,
                rows,
                start.elapsed().as_secs_f64()
            );
        }

        Commands::FetchAirports { output, force } => {
            let path = install_airports_database(
                &config.airports_database(),
                output,
                force,
                &mut ConsoleUi::new(),
            )?;
            println!("Airport database at {:?}", path);
        }

        Commands::ListSteps => {
            println!("Pipeline steps:\n");
            for step in Step::ALL {
                let deps: Vec<&str> = step.dependencies().iter().map(Step::name).collect();
                let tables: Vec<&str> = step.tables().iter().map(|t| t.name).collect();
                let mut line = step.name().to_string();
                if !deps.is_empty() {
                    line.push_str(&format!(" (after {})", deps.join(", ")));
                }
                if !tables.is_empty() {
                    line.push_str(&format!(" -> {}", tables.join(", ")));
                }
                println!("  {}", line);
            }
        }

        Commands::ListTables => {
            println!("Available tables:\n");
            for line in table_listing() {
                println!("  {}", line);
            }
        }

        Commands::Config => {
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}
