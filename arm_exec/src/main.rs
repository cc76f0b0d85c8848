//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and the simulation
//!     - Main loop:
//!         - Command acquisition, from the script or the automatic start
//!         - Simulation processing (task sequencer, joint driver, grasp model)
//!         - Frame recording
//!     - Save the recorded frames into the session
//!
//! # Modules
//!
//! All modules (e.g. `sim`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use arm_lib::{
    sim::{ArmCmd, ArmFrame, ArmSim, InputData},
    task_seq::TaskPhase,
    CYCLE_FREQUENCY_HZ, CYCLE_PERIOD_S,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingCmds, ScriptInterpreter},
    session::Session,
    time,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the file the frame trace is saved to in the session directory.
const TRACE_FILE_NAME: &str = "trace.json";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Pick and place arm simulation.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec")]
struct Opts {
    /// Parameter file to load, relative to the params directory.
    #[structopt(long, default_value = "arm_sim.toml")]
    params: String,

    /// Command script to execute. If not given the pick and place task is
    /// started on the first cycle and the executable stops once it is done.
    #[structopt(long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Stop after this many cycles.
    #[structopt(long)]
    max_ticks: Option<u64>,

    /// Sleep at the end of each cycle to run at the nominal cycle rate.
    #[structopt(long)]
    realtime: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the commands incoming to the exec.
enum CmdSource {
    /// Start the task once and run it to completion.
    Auto { started: bool },
    Script(ScriptInterpreter<ArmCmd>),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, Some(&session.log_file_path))
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Simulation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- INITIALISE CMD SOURCE ----

    let mut cmd_source = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} commands\n",
                si.get_duration(),
                si.get_num_cmds()
            );

            CmdSource::Script(si)
        }
        None => {
            info!("No script provided, the pick and place task will be run once\n");
            CmdSource::Auto { started: false }
        }
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut sim = ArmSim::default();
    sim.init(opts.params.clone())
        .wrap_err("Failed to initialise ArmSim")?;
    info!("ArmSim init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop at {:.01} Hz\n", CYCLE_FREQUENCY_HZ);

    let mut frames: Vec<ArmFrame> = Vec::new();
    let mut script_ended = false;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        if let Some(max) = opts.max_ticks {
            if sim.num_cycles() >= max {
                info!("Maximum number of cycles ({}) reached, stopping", max);
                break;
            }
        }

        // ---- COMMAND ACQUISITION ----

        let sim_time_s = time::cycles_to_seconds(sim.num_cycles(), CYCLE_PERIOD_S);

        let cmds = match cmd_source {
            CmdSource::Auto { ref mut started } => {
                if !*started {
                    *started = true;
                    vec![ArmCmd::Start]
                } else if sim.phase() == TaskPhase::Idle {
                    info!("Task finished, stopping");
                    break;
                } else {
                    vec![]
                }
            }
            CmdSource::Script(ref mut si) => match si.get_pending_cmds(sim_time_s) {
                PendingCmds::None => vec![],
                PendingCmds::Some(cmds) => cmds,
                PendingCmds::EndOfScript => {
                    if !script_ended {
                        info!("End of command script reached, waiting for the arm to finish");
                        script_ended = true;
                    }

                    if sim.phase() == TaskPhase::Idle && sim.arm().arrived() {
                        info!("Arm idle, stopping");
                        break;
                    }

                    vec![]
                }
            },
        };

        // ---- SIMULATION PROCESSING ----

        // Each command gets its own cycle so none are lost
        let mut inputs: Vec<InputData> = cmds
            .into_iter()
            .map(|cmd| InputData { cmd: Some(cmd) })
            .collect();
        if inputs.is_empty() {
            inputs.push(InputData::default());
        }

        for input in inputs.iter() {
            let result = match sim.proc(input) {
                Ok(r) => Ok(r),
                Err(e) => {
                    // A bad command shouldn't stop the arm, so warn and run
                    // the cycle without it
                    warn!("Error during ArmSim processing: {}", e);
                    sim.proc(&InputData::default())
                }
            };

            match result {
                Ok((frame, report)) => {
                    if report.cmd_ignored {
                        warn!("Command {:?} ignored", input.cmd);
                    }
                    if report.grasp_missed {
                        warn!("Grasp missed at cycle {}", frame.cycle);
                    }
                    if report.arm.reach_limited {
                        debug!("Target out of reach at cycle {}", frame.cycle);
                    }

                    frames.push(frame);
                }
                Err(e) => warn!("Error during ArmSim processing: {}", e),
            }
        }

        // ---- CYCLE MANAGEMENT ----

        if opts.realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                ),
            }
        }
    }

    // ---- SHUTDOWN ----

    let obj = sim.object_position();
    info!(
        "Finished after {} cycles ({:.01} s), object at ({:.03}, {:.03}, {:.03})",
        sim.num_cycles(),
        time::cycles_to_seconds(sim.num_cycles(), CYCLE_PERIOD_S),
        obj.x,
        obj.y,
        obj.z
    );

    let trace_path = session
        .save_json(TRACE_FILE_NAME, &frames)
        .wrap_err("Failed to save the frame trace")?;
    info!("Frame trace saved to {:?}", trace_path);

    info!("End of execution");

    Ok(())
}
