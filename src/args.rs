//! Command-line argument parsing and processing.
//!
//! The flag grammar keeps the original tool's single-dash long options
//! (`-set`, `-time`, `-display`, ...) alongside double-dash spellings, and
//! rescues a leading-dash numeric token such as `-30` as a brightness
//! expression. Parsing produces strongly-typed parameters; nothing below
//! this module knows about flag syntax.

use std::time::Duration;

use log::warn;

use crate::constants::{DEFAULT_FADE_TIME_MS, DEFAULT_FPS, MAX_FADE_TIME_MS};
use crate::fade::FadeTiming;
use crate::output::OutputSelector;
use crate::request::{BrightnessRequest, is_number_like};

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Query or change brightness with these settings
    Run(RunParams),
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to malformed or conflicting arguments and exit non-zero
    ShowHelpDueToError,
}

/// Validated parameters for one get/set invocation.
#[derive(Debug, PartialEq)]
pub struct RunParams {
    pub display: Option<String>,
    pub verbose: bool,
    pub selectors: Vec<OutputSelector>,
    /// `None` means query only.
    pub request: Option<BrightnessRequest>,
    pub timing: FadeTiming,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from std::env::args())
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut display: Option<String> = None;
        let mut verbose = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut get = false;
        let mut set_arg: Option<String> = None;
        let mut inc_arg: Option<String> = None;
        let mut dec_arg: Option<String> = None;
        let mut positional: Option<String> = None;
        let mut selectors: Vec<OutputSelector> = Vec::new();
        let mut time_ms = DEFAULT_FADE_TIME_MS;
        let mut fps: Option<f64> = None;
        let mut steps: Option<u32> = None;
        let mut bad_arg_found = false;

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg_str = &args_vec[i];
            match arg_str.as_str() {
                "-h" | "--help" => display_help = true,
                "-version" | "--version" => display_version = true,
                "-v" | "--verbose" => verbose = true,
                "-get" | "--get" => get = true,
                "-d" | "-display" | "--display" => {
                    match take_value(&args_vec, &mut i, arg_str) {
                        Some(value) => display = Some(value),
                        None => bad_arg_found = true,
                    }
                }
                "-o" | "--output" => match take_value(&args_vec, &mut i, arg_str) {
                    Some(value) => match OutputSelector::parse(&value) {
                        Ok(selector) => selectors.push(selector),
                        Err(e) => {
                            warn!("{e:#}");
                            bad_arg_found = true;
                        }
                    },
                    None => bad_arg_found = true,
                },
                "-set" | "--set" => match take_value(&args_vec, &mut i, arg_str) {
                    Some(value) => set_arg = Some(value),
                    None => bad_arg_found = true,
                },
                "-inc" | "--increase" => match take_value(&args_vec, &mut i, arg_str) {
                    Some(value) => inc_arg = Some(value),
                    None => bad_arg_found = true,
                },
                "-dec" | "--decrease" => match take_value(&args_vec, &mut i, arg_str) {
                    Some(value) => dec_arg = Some(value),
                    None => bad_arg_found = true,
                },
                "-t" | "-time" | "--time" => match take_value(&args_vec, &mut i, arg_str) {
                    Some(value) => match parse_millis(&value) {
                        Some(ms) => time_ms = ms,
                        None => {
                            warn!("Invalid fade time: {value}");
                            bad_arg_found = true;
                        }
                    },
                    None => bad_arg_found = true,
                },
                "-f" | "--fps" => match take_value(&args_vec, &mut i, arg_str) {
                    Some(value) => match value.parse::<f64>() {
                        Ok(v) if v > 0.0 => fps = Some(v),
                        _ => {
                            warn!("Invalid frame rate: {value}");
                            bad_arg_found = true;
                        }
                    },
                    None => bad_arg_found = true,
                },
                "-steps" | "--steps" => match take_value(&args_vec, &mut i, arg_str) {
                    Some(value) => match value.parse::<u32>() {
                        Ok(v) if v >= 1 => steps = Some(v),
                        _ => {
                            warn!("Invalid step count: {value}");
                            bad_arg_found = true;
                        }
                    },
                    None => bad_arg_found = true,
                },
                other => {
                    // A token like "-30" is a brightness expression, not an
                    // option, as long as no other brightness argument was
                    // given.
                    let brightness_given = get
                        || set_arg.is_some()
                        || inc_arg.is_some()
                        || dec_arg.is_some()
                        || positional.is_some();
                    if !brightness_given && is_number_like(other, true) {
                        positional = Some(other.to_string());
                    } else {
                        warn!("Unknown argument: {other}");
                        bad_arg_found = true;
                    }
                }
            }
            i += 1;
        }

        // The brightness arguments are mutually exclusive.
        let brightness_flags = usize::from(get)
            + usize::from(set_arg.is_some())
            + usize::from(inc_arg.is_some())
            + usize::from(dec_arg.is_some())
            + usize::from(positional.is_some());
        if brightness_flags > 1 {
            warn!("-get, -set, -inc, -dec and a bare brightness are mutually exclusive");
            bad_arg_found = true;
        }
        if fps.is_some() && steps.is_some() {
            warn!("-fps and -steps are mutually exclusive");
            bad_arg_found = true;
        }

        let request = build_request(&set_arg, &inc_arg, &dec_arg, &positional);
        if request.is_none()
            && (set_arg.is_some() || inc_arg.is_some() || dec_arg.is_some() || positional.is_some())
        {
            bad_arg_found = true;
        }

        let duration = Duration::from_secs_f64(time_ms / 1000.0);
        let timing = match steps {
            Some(steps) if duration.is_zero() => {
                warn!("-steps {steps} needs a nonzero fade time");
                bad_arg_found = true;
                FadeTiming::from_fps(DEFAULT_FPS, duration)
            }
            Some(steps) => FadeTiming::from_steps(steps, duration),
            None => FadeTiming::from_fps(fps.unwrap_or(DEFAULT_FPS), duration),
        };

        let action = if display_version {
            CliAction::ShowVersion
        } else if bad_arg_found {
            CliAction::ShowHelpDueToError
        } else if display_help {
            CliAction::ShowHelp
        } else {
            CliAction::Run(RunParams {
                display,
                verbose,
                selectors,
                request: request.flatten(),
                timing,
            })
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Consume the value following a flag, advancing the index.
fn take_value(args: &[String], i: &mut usize, flag: &str) -> Option<String> {
    if *i + 1 < args.len() {
        *i += 1;
        Some(args[*i].clone())
    } else {
        warn!("Missing value for {flag}");
        None
    }
}

/// Fade time in milliseconds; a trailing `s` switches the unit to seconds.
///
/// Rejects non-finite and overlarge values: the result must stay inside
/// the domain `Duration::from_secs_f64` accepts.
fn parse_millis(s: &str) -> Option<f64> {
    let (body, scale) = match s.strip_suffix('s') {
        Some(body) => (body, 1000.0),
        None => (s, 1.0),
    };
    let value: f64 = body.parse().ok()?;
    let ms = value * scale;
    (ms.is_finite() && (0.0..=MAX_FADE_TIME_MS).contains(&ms)).then_some(ms)
}

/// Assemble the brightness request from whichever argument was given.
///
/// Outer `None` marks a parse failure; inner `None` means query only.
fn build_request(
    set_arg: &Option<String>,
    inc_arg: &Option<String>,
    dec_arg: &Option<String>,
    positional: &Option<String>,
) -> Option<Option<BrightnessRequest>> {
    let expression = if let Some(v) = set_arg {
        if !is_number_like(v, false) {
            warn!("Invalid brightness for -set: {v}");
            return None;
        }
        v.clone()
    } else if let Some(v) = inc_arg {
        if !is_number_like(v, false) {
            warn!("Invalid brightness for -inc: {v}");
            return None;
        }
        format!("+{v}")
    } else if let Some(v) = dec_arg {
        if !is_number_like(v, false) {
            warn!("Invalid brightness for -dec: {v}");
            return None;
        }
        format!("-{v}")
    } else if let Some(v) = positional {
        v.clone()
    } else {
        return Some(None);
    };

    match BrightnessRequest::parse(&expression) {
        Ok(request) => Some(Some(request)),
        Err(e) => {
            warn!("{e:#}");
            None
        }
    }
}

/// Displays version information.
pub fn display_version_info() {
    println!("backlightr {}", env!("CARGO_PKG_VERSION"));
}

/// Displays the usage message.
pub fn display_help() {
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("Usage: backlightr [OPTIONS] [BRIGHTNESS]");
    println!();
    println!("Change brightness. Prefix with =/-/+ to set/decrement/increment");
    println!("(default: set); suffix with %/= for percentage/native units");
    println!("(default: percentage).");
    println!();
    println!("Options:");
    println!("  -d, -display DISPLAY      Connect to the specified display");
    println!("  -v, --verbose             Output more information");
    println!("  -o, --output SCREEN:OUTPUT");
    println!("                            Only apply to specified outputs (repeatable;");
    println!("                            either side may be empty to match any)");
    println!("  -get                      Get brightness");
    println!("  -set BRIGHTNESS           Set brightness");
    println!("  -inc BRIGHTNESS           Increase brightness");
    println!("  -dec BRIGHTNESS           Decrease brightness");
    println!("  -t, -time MILLISECONDS    Fade time (default 200; suffix s for seconds)");
    println!("  -f, --fps FPS             Frames per second (default 30)");
    println!("  -steps CARDINAL           Total number of steps to fade");
    println!("  -version                  Display version number and exit");
    println!("  -h, --help                Print help information");
}
