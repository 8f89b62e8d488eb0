/*****************************************************************************************[main.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process::exit;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches};
use flate2::bufread::GzDecoder;
use lazysat::{
    dimacs, lbool, Budget, Callbacks, Minimization, PhaseSaving, ProgressStatus, Solver,
    SolverInterface, SolverOpts,
};
use log::debug;

mod system;

/// Callbacks printing a MiniSat-style progress table, and enforcing the CPU limit.
struct Verbose {
    verbosity: i32,
    cpu_lim: Option<(system::ResourceMeasure, f64)>,
}

impl Callbacks for Verbose {
    fn on_start(&mut self) {
        if self.verbosity >= 1 {
            println!("c ============================[ Search Statistics ]==============================");
            println!("c | Conflicts |          ORIGINAL         |          LEARNT          | Progress |");
            println!("c |           |    Vars  Clauses Literals |    Limit  Clauses Lit/Cl |          |");
            println!("c ===============================================================================");
        }
    }

    fn on_gc(&mut self, old_size: usize, new_size: usize) {
        if self.verbosity >= 2 {
            println!(
                "c |  Garbage collection:   {:12} bytes => {:12} bytes             |",
                old_size, new_size
            );
        }
    }

    fn on_progress<F>(&mut self, f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        if self.verbosity >= 1 {
            let p = f();
            println!(
                "c | {:9} | {:7} {:8} {:8} | {:8} {:8} {:6.0} | {:6.3} % |",
                p.conflicts,
                p.dec_vars,
                p.n_clauses,
                p.n_clause_lits,
                p.max_learnt,
                p.n_learnt,
                p.n_learnt_lits,
                p.progress_estimate
            );
        }
    }

    fn on_result(&mut self, _s: lbool) {
        if self.verbosity >= 1 {
            println!("c ===============================================================================");
        }
    }

    fn stop(&self) -> bool {
        match self.cpu_lim {
            Some((ref r, max_cpu)) => r.cpu_time() > max_cpu,
            None => false,
        }
    }
}

type CliSolver = Solver<Verbose>;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{:#}", err);
        exit(1)
    });
    exit(exitcode);
}

/// Parse option `name`, falling back to `default` if it is absent or malformed.
fn opt<T: std::str::FromStr>(matches: &ArgMatches, name: &str, default: T) -> T {
    matches
        .value_of(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main2() -> anyhow::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("lazysat")
        .version("0.1.0")
        .about("CDCL SAT engine with lazily explained variables")
        .arg(Arg::with_name("input-file"))
        .arg(Arg::with_name("result-output-file"))
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .help("Limit on CPU time allowed in seconds")
                .default_value("-1.0")
                .takes_value(true),
        )
        .arg(Arg::with_name("is-strict").long("strict")
             .help("Check the clause count of the DIMACS header"))
        .arg(Arg::with_name("var-decay").long("var-decay")
             .help("The variable activity decay factor")
             .default_value("0.95")
             .takes_value(true))
        .arg(Arg::with_name("clause-decay").long("cla-decay")
             .help("The clause activity decay factor")
             .default_value("0.999")
             .takes_value(true))
        .arg(Arg::with_name("random-var-freq").long("rnd-freq")
             .help("The frequency with which the decision heuristic tries to choose a random variable")
             .default_value("0.0")
             .takes_value(true))
        .arg(Arg::with_name("random-seed").long("rnd-seed")
             .help("Used by the random variable selection")
             .default_value("91648253.0")
             .takes_value(true))
        .arg(Arg::with_name("ccmin-mode").long("ccmin-mode")
             .help("Controls conflict clause minimization (0=none, 1=basic)")
             .default_value("1")
             .takes_value(true))
        .arg(Arg::with_name("phase-saving").long("phase-saving")
             .help("Controls the level of phase saving (0=none, 1=limited, 2=full)")
             .default_value("2")
             .takes_value(true))
        .arg(Arg::with_name("rnd-init").long("rnd-init")
             .help("Randomize the initial activity"))
        .arg(Arg::with_name("no-luby-restart").long("no-luby")
             .help("Do not use the Luby restart sequence"))
        .arg(Arg::with_name("restart-first").long("rfirst")
             .help("The base restart interval")
             .default_value("100")
             .takes_value(true))
        .arg(Arg::with_name("restart-inc").long("rinc")
             .help("Restart interval increase factor")
             .default_value("2.0")
             .takes_value(true))
        .arg(Arg::with_name("garbage-frac").long("gc-frac")
             .help("The fraction of wasted memory allowed before a garbage collection is triggered")
             .default_value("0.20")
             .takes_value(true))
        .arg(Arg::with_name("min-learnts-lim").long("min-learnts")
             .help("Minimum learnt clause limit")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("conflicts").long("conflicts")
             .help("Maximum number of conflicts")
             .takes_value(true))
        .arg(Arg::with_name("propagations").long("propagations")
             .help("Maximum number of propagations")
             .takes_value(true))
        .get_matches();

    let mut solver_opts = SolverOpts::default();
    solver_opts.var_decay = opt(&matches, "var-decay", solver_opts.var_decay);
    solver_opts.clause_decay = opt(&matches, "clause-decay", solver_opts.clause_decay);
    solver_opts.random_var_freq = opt(&matches, "random-var-freq", solver_opts.random_var_freq);
    solver_opts.random_seed = opt(&matches, "random-seed", solver_opts.random_seed);
    solver_opts.ccmin_mode = match Minimization::from_level(opt(&matches, "ccmin-mode", 1)) {
        Some(m) => m,
        None => bail!("invalid value for option \"ccmin-mode\""),
    };
    solver_opts.phase_saving = match PhaseSaving::from_level(opt(&matches, "phase-saving", 2)) {
        Some(p) => p,
        None => bail!("invalid value for option \"phase-saving\""),
    };
    solver_opts.rnd_init_act = matches.is_present("rnd-init");
    solver_opts.luby_restart = !matches.is_present("no-luby-restart");
    solver_opts.restart_first = opt(&matches, "restart-first", solver_opts.restart_first);
    solver_opts.restart_inc = opt(&matches, "restart-inc", solver_opts.restart_inc);
    solver_opts.garbage_frac = opt(&matches, "garbage-frac", solver_opts.garbage_frac);
    solver_opts.min_learnts_lim = opt(&matches, "min-learnts-lim", solver_opts.min_learnts_lim);

    if !solver_opts.check() {
        bail!("Invalid option value");
    }

    let input_file = matches.value_of("input-file");
    let result_output_file = matches.value_of("result-output-file");
    let verbosity: i32 = opt(&matches, "verbosity", 0);
    if verbosity < 0 || verbosity > 2 {
        bail!("ERROR! value <{}> is out of range for option \"verb\".", verbosity);
    }
    let is_strict = matches.is_present("is-strict");
    let cpu_lim = Some(opt(&matches, "cpu-lim", -1.0)).filter(|x: &f64| *x > 0.);
    let budget = Budget {
        conflicts: matches.value_of("conflicts").and_then(|s| s.parse().ok()),
        propagations: matches.value_of("propagations").and_then(|s| s.parse().ok()),
    };

    // setup timeout handler, if any
    let cb = Verbose {
        verbosity,
        cpu_lim: cpu_lim.map(|max_cpu| (system::ResourceMeasure::new(), max_cpu)),
    };
    let mut solver = Solver::new(solver_opts, cb);
    solver.set_budget(budget);

    let initial_time = Instant::now();

    if let Some(input_file) = input_file {
        debug!("solve file {}", input_file);
        let file = File::open(input_file)
            .with_context(|| format!("cannot open {}", input_file))?;
        read_input_autogz(BufReader::new(file), &mut solver, is_strict, verbosity)?;
    } else {
        println!("c Reading from standard input... Use '--help' for help.");
        let stdin = io::stdin();
        read_input_autogz(stdin.lock(), &mut solver, is_strict, verbosity)?;
    }

    let mut resfile = match result_output_file {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path))?,
        )),
        None => None,
    };

    if verbosity > 0 {
        println!(
            "c |  Number of variables:  {:12}                                         |",
            solver.num_vars()
        );
        println!(
            "c |  Number of clauses:    {:12}                                         |",
            solver.num_clauses()
        );
        let duration = initial_time.elapsed();
        println!(
            "c |  Parse time:           {:9}.{:02} s                                       |",
            duration.as_secs(),
            duration.subsec_nanos() / 10_000_000
        );
        println!("c |                                                                             |");
    }

    if !solver.simplify() {
        if let Some(resfile) = resfile.as_mut() {
            writeln!(resfile, "s UNSAT")?;
            resfile.flush()?;
        }
        if verbosity > 0 {
            println!(
                "c ==============================================================================="
            );
            println!("c Solved by unit propagation");
            solver.print_stats();
        }
        println!("s UNSATISFIABLE");
        return Ok(20);
    }

    let ret = solver.solve_limited();
    if verbosity > 0 {
        solver.print_stats();
        println!("c CPU time              : {:.3}s", resource.cpu_time());
    }
    if ret == lbool::TRUE {
        println!("s SATISFIABLE");
    } else if ret == lbool::FALSE {
        println!("s UNSATISFIABLE");
    } else {
        println!("s INDETERMINATE");
    }
    if let Some(resfile) = resfile.as_mut() {
        if ret == lbool::TRUE {
            writeln!(resfile, "s SAT")?;
            write!(resfile, "{}", solver.dimacs_model())?;
        } else if ret == lbool::FALSE {
            writeln!(resfile, "s UNSAT")?;
        } else {
            writeln!(resfile, "s INDET")?;
        }
        resfile.flush()?;
    }

    let exitcode = if ret == lbool::TRUE {
        10
    } else if ret == lbool::FALSE {
        20
    } else {
        0
    };
    Ok(exitcode)
}

fn read_input_autogz<R: BufRead>(
    mut input: R,
    solver: &mut CliSolver,
    is_strict: bool,
    verbosity: i32,
) -> anyhow::Result<()> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        read_input(
            BufReader::new(GzDecoder::new(input)),
            solver,
            is_strict,
            verbosity,
        )
    } else {
        read_input(input, solver, is_strict, verbosity)
    }
}

fn read_input<R: BufRead>(
    mut input: R,
    solver: &mut CliSolver,
    is_strict: bool,
    verbosity: i32,
) -> anyhow::Result<()> {
    if verbosity > 0 {
        println!("c ============================[ Problem Statistics ]=============================");
        println!("c |                                                                             |");
    }
    dimacs::parse(&mut input, solver, is_strict).context("cannot read DIMACS input")?;
    Ok(())
}
