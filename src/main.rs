use anyhow::{Result, bail};
use env_logger::Env;
use log::error;

use backlightr::args::{CliAction, ParsedArgs, RunParams, display_help, display_version_info};
use backlightr::output::OutputFilter;
use backlightr::report::print_report;
use backlightr::{X11Backend, fade, resolve};

fn main() {
    // Diagnostics go to stderr; the brightness report owns stdout.
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match ParsedArgs::from_env().action {
        CliAction::ShowHelp => display_help(),
        CliAction::ShowVersion => display_version_info(),
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(1);
        }
        CliAction::Run(params) => {
            if let Err(e) = run(params) {
                error!("{e:#}");
                std::process::exit(1);
            }
        }
    }
}

/// One get/set invocation: open the session, resolve matching outputs,
/// fade if a change was requested, report.
fn run(params: RunParams) -> Result<()> {
    let mut backend = X11Backend::connect(params.display.as_deref())?;
    let filter = OutputFilter::from_selectors(&params.selectors);

    let readings = resolve(&mut backend, &filter)?;
    if readings.is_empty() {
        bail!("no backlight-capable outputs matched");
    }

    let plan = match &params.request {
        Some(request) => Some(fade(&mut backend, &readings, request, &params.timing)?),
        None => None,
    };

    print_report(&readings, plan.as_ref(), params.verbose);
    Ok(())
}
