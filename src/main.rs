mod errors;
mod quality;
mod dealer;
mod dealers;
mod marketplace;
mod auction;
mod campaign;
mod config;
mod report;
mod charts;
mod scenarios;
mod logger;
mod utils;

use config::CampaignConfig;
use logger::{Logger, LogEvent, ConsoleReceiver, FileReceiver, sanitize_filename};
use report::{PerformanceReport, RoiAssumptions};
use std::path::{Path, PathBuf};

use scenarios::get_scenario_catalog;
use utils::{RAND_SEED, TOTAL_CAMPAIGN_RUNS};
use std::sync::atomic::Ordering;

const CHARTS_FILE: &str = "charts/performance.png";

/// Load, run and report one campaign
fn run_campaign(config: CampaignConfig, render_charts: bool, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let (days, searches_per_day) = (config.days, config.searches_per_day);
    let (mut runner, rejected) = config.build(logger)?;
    if !rejected.is_empty() {
        warnln!(logger, LogEvent::Campaign, "{} dealer(s) rejected and left out of the campaign", rejected.len());
    }

    runner.run_campaign(days, searches_per_day, logger)?;

    let report = PerformanceReport::new(&runner.marketplace.dealers, runner.history(), &RoiAssumptions::default());
    report.printout(logger);

    if render_charts {
        charts::generate_performance_charts(&report, CHARTS_FILE)?;
        logln!(logger, LogEvent::Report, "\nCharts written to {}", CHARTS_FILE);
    }
    Ok(())
}

fn campaign_logger() -> Logger {
    let mut logger = Logger::new();
    let mut events = vec![LogEvent::Campaign, LogEvent::Report];
    if utils::VERBOSE_AUCTION.load(Ordering::Relaxed) {
        events.push(LogEvent::Auction);
    }
    logger.add_receiver(ConsoleReceiver::new(events));
    logger
}

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Parse and filter out --verbose, --fastbreak and --charts arguments
    let mut args = Vec::new();
    let mut skip_next = false;
    let mut fastbreak = false;
    let mut render_charts = false;
    for (i, arg) in raw_args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--verbose" {
            if i + 1 < raw_args.len() && raw_args[i + 1] == "auction" {
                utils::VERBOSE_AUCTION.store(true, Ordering::Relaxed);
                skip_next = true;
            }
            continue;
        }
        if arg == "--fastbreak" {
            fastbreak = true;
            continue;
        }
        if arg == "--charts" {
            render_charts = true;
            continue;
        }
        args.push(arg.clone());
    }

    if args.len() > 1 && args[1] == "campaign" {
        let Some(path) = args.get(2) else {
            eprintln!("Error: Usage: campaign <config.json> [--charts]");
            std::process::exit(1);
        };
        let mut config = match CampaignConfig::from_file(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading campaign '{}': {}", path, e);
                std::process::exit(1);
            }
        };
        let mut logger = campaign_logger();
        config.auction.log_auctions |= utils::VERBOSE_AUCTION.load(Ordering::Relaxed);
        if let Err(e) = run_campaign(config, render_charts, &mut logger) {
            eprintln!("Error running campaign: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if args.len() > 1 {
        let scenario_arg = &args[1];

        let iterations = if args.len() > 2 {
            match args[2].parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid iterations parameter '{}'. Expected a number.", args[2]);
                    std::process::exit(1);
                }
            }
        } else {
            1
        };

        let start_iteration = if args.len() > 3 {
            match args[3].parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid start iteration parameter '{}'. Expected a number.", args[3]);
                    std::process::exit(1);
                }
            }
        } else {
            0
        };

        let all_scenarios = get_scenario_catalog();

        let scenarios: Vec<_> = if scenario_arg == "all" {
            all_scenarios.clone()
        } else {
            match all_scenarios.iter().find(|s| s.short_name == scenario_arg) {
                Some(scenario) => vec![scenario.clone()],
                None => {
                    eprintln!("Error: Scenario '{}' not found.", scenario_arg);
                    eprintln!("Available scenarios:");
                    for s in &all_scenarios {
                        eprintln!("  - {}", s.short_name);
                    }
                    std::process::exit(1);
                }
            }
        };

        // Individual checks only reach the console for a single scenario run once
        let mut logger = Logger::new();
        if scenario_arg != "all" && iterations == 1 {
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation, LogEvent::Scenario]));
        } else {
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
        }

        let summary_receiver_id = match FileReceiver::new(&PathBuf::from("log/summary.log"), vec![LogEvent::Validation]) {
            Ok(receiver) => Some(logger.add_receiver(receiver)),
            Err(e) => {
                eprintln!("Warning: cannot open log/summary.log: {}", e);
                None
            }
        };

        TOTAL_CAMPAIGN_RUNS.store(0, Ordering::Relaxed);

        if scenario_arg == "all" {
            logln!(&mut logger, LogEvent::Validation, "Running all scenarios {} time(s)...\n", iterations);
        } else {
            logln!(&mut logger, LogEvent::Validation, "Running scenario '{}' {} time(s)...\n", scenario_arg, iterations);
        }

        let mut failures = 0;
        'scenarios: for scenario in &scenarios {
            log!(&mut logger, LogEvent::Validation, "{}: ", scenario.short_name);

            let scenario_log = PathBuf::from(format!("log/{}/scenario.log", sanitize_filename(scenario.short_name)));
            let mut scenario_events = vec![LogEvent::Scenario, LogEvent::Campaign, LogEvent::Report];
            if utils::VERBOSE_AUCTION.load(Ordering::Relaxed) {
                scenario_events.push(LogEvent::Auction);
            }
            let scenario_receiver_id = match FileReceiver::new(&scenario_log, scenario_events) {
                Ok(receiver) => Some(logger.add_receiver(receiver)),
                Err(e) => {
                    warnln!(&mut logger, LogEvent::Validation, "cannot open {}: {}", scenario_log.display(), e);
                    None
                }
            };

            for i in start_iteration..(start_iteration + iterations) {
                if iterations > 1 {
                    log!(&mut logger, LogEvent::Validation, "[{}/{}] ", i - start_iteration + 1, iterations);
                }

                RAND_SEED.store(i, Ordering::Relaxed);

                match (scenario.run)(scenario.short_name, &mut logger) {
                    Ok(()) => {
                        if iterations > 1 {
                            logln!(&mut logger, LogEvent::Validation, "✓");
                        } else {
                            logln!(&mut logger, LogEvent::Validation, "✓ PASSED");
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        if iterations > 1 {
                            logln!(&mut logger, LogEvent::Validation, "✗");
                        } else {
                            logln!(&mut logger, LogEvent::Validation, "✗ FAILED: {}", e);
                        }

                        if fastbreak {
                            if let Some(id) = scenario_receiver_id {
                                logger.remove_receiver(id);
                            }
                            logln!(&mut logger, LogEvent::Validation, "\nStopping scenario execution due to failure (--fastbreak enabled)");
                            logln!(&mut logger, LogEvent::Validation, "Error at seed {}: {}", i, e);
                            break 'scenarios;
                        }
                    }
                }

                let _ = logger.flush();
            }

            if let Some(id) = scenario_receiver_id {
                logger.remove_receiver(id);
            }
        }

        logln!(&mut logger, LogEvent::Validation, "\nTotal campaign runs completed: {}", TOTAL_CAMPAIGN_RUNS.load(Ordering::Relaxed));
        let _ = logger.flush();

        if let Some(id) = summary_receiver_id {
            logger.remove_receiver(id);
        }
        if failures > 0 {
            std::process::exit(1);
        }
    } else {
        // Default: the Philadelphia market with a console report
        let mut logger = campaign_logger();
        let mut config = CampaignConfig::philadelphia();
        config.auction.log_auctions = utils::VERBOSE_AUCTION.load(Ordering::Relaxed);
        if let Err(e) = run_campaign(config, render_charts, &mut logger) {
            eprintln!("Error running campaign: {}", e);
            std::process::exit(1);
        }
    }
}
