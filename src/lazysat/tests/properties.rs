//! Property-based tests for the search engine.
//!
//! Random small CNFs are cross-checked against a brute-force enumeration,
//! under various configurations and ways of driving the search.

use lazysat::{
    lbool, BasicCallbacks, BasicSolver, Lit, PhaseSaving, Solver, SolverInterface, SolverOpts,
    Var,
};
use proptest::prelude::*;

// ============================================================================
// Helper functions
// ============================================================================

const MAX_VARS: u32 = 8;

type Cnf = Vec<Vec<(u32, bool)>>;

fn cnf_strategy() -> impl Strategy<Value = (u32, Cnf)> {
    (1..=MAX_VARS).prop_flat_map(|n| {
        let clause = prop::collection::vec((0..n, any::<bool>()), 1..4);
        (Just(n), prop::collection::vec(clause, 0..30))
    })
}

fn satisfied_by(cnf: &Cnf, model: impl Fn(u32) -> bool) -> bool {
    cnf.iter()
        .all(|c| c.iter().any(|&(v, sign)| model(v) == sign))
}

/// Is there any satisfying assignment?
fn brute_force(n: u32, cnf: &Cnf) -> bool {
    (0..1u32 << n).any(|bits| satisfied_by(cnf, |v| bits & (1 << v) != 0))
}

fn mk_solver(n: u32, opts: SolverOpts) -> (BasicSolver, Vec<Var>) {
    let mut s = Solver::new(opts, BasicCallbacks::new());
    let vars = (0..n).map(|_| s.new_var_default()).collect();
    (s, vars)
}

fn lits(vars: &[Var], c: &[(u32, bool)]) -> Vec<Lit> {
    c.iter()
        .map(|&(v, sign)| Lit::new(vars[v as usize], sign))
        .collect()
}

fn solve(n: u32, cnf: &Cnf, opts: SolverOpts) -> (lbool, BasicSolver, Vec<Var>) {
    let (mut s, vars) = mk_solver(n, opts);
    for c in cnf {
        s.add_clause(&lits(&vars, c));
    }
    let res = s.solve_limited();
    (res, s, vars)
}

/// Search driven from the outside, the way a CP layer does it: decide the
/// first unassigned variable (false first) and learn from every conflict.
fn drive(s: &mut BasicSolver, vars: &[Var]) -> lbool {
    loop {
        if !s.propagate() {
            if !s.resolve_conflict() {
                return lbool::FALSE;
            }
            continue;
        }
        match vars.iter().find(|&&v| s.value_var(v) == lbool::UNDEF) {
            Some(&v) => s.decide(Lit::new(v, false)),
            None => return lbool::TRUE,
        }
    }
}

/// Like `drive`, but open up to `width` levels before propagating, so that
/// facts implied by earlier decisions land on later levels.
fn drive_lazily(s: &mut BasicSolver, vars: &[Var], width: usize) -> lbool {
    loop {
        if !s.propagate() {
            if !s.resolve_conflict() {
                return lbool::FALSE;
            }
            continue;
        }
        let mut opened = 0;
        for &v in vars {
            if opened == width.max(1) {
                break;
            }
            if s.value_var(v) == lbool::UNDEF {
                s.decide(Lit::new(v, opened % 2 == 1));
                opened += 1;
            }
        }
        if opened == 0 {
            return lbool::TRUE;
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_agrees_with_brute_force((n, cnf) in cnf_strategy()) {
        let (res, s, vars) = solve(n, &cnf, SolverOpts::default());
        prop_assert_ne!(res, lbool::UNDEF);
        prop_assert_eq!(res == lbool::TRUE, brute_force(n, &cnf));
        if res == lbool::TRUE {
            prop_assert!(satisfied_by(&cnf, |v| s.model_value(Lit::new(vars[v as usize], true)) == lbool::TRUE));
        } else {
            prop_assert!(!s.is_ok());
        }
        prop_assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn prop_restart_schedule_independent(
        (n, cnf) in cnf_strategy(),
        luby in any::<bool>(),
        first in 1..20i32,
        phase in 0..3i32,
        rnd_freq in prop_oneof![Just(0.0), Just(0.5), Just(1.0)],
    ) {
        let mut opts = SolverOpts::default();
        opts.luby_restart = luby;
        opts.restart_first = first;
        opts.phase_saving = PhaseSaving::from_level(phase).unwrap();
        opts.rnd_pol = luby;
        opts.random_var_freq = rnd_freq;
        let (res, _, _) = solve(n, &cnf, opts);
        let (expected, _, _) = solve(n, &cnf, SolverOpts::default());
        prop_assert_eq!(res, expected);
    }

    #[test]
    fn prop_unreliable_vars_stay_sound(
        (n, cnf) in cnf_strategy(),
        mask in any::<u8>(),
    ) {
        let (mut s, vars) = mk_solver(n, SolverOpts::default());
        for (i, &v) in vars.iter().enumerate() {
            s.set_reliable(v, mask & (1 << i) == 0);
        }
        for c in &cnf {
            s.add_clause(&lits(&vars, c));
        }
        let res = s.solve_limited();
        prop_assert_eq!(res == lbool::TRUE, brute_force(n, &cnf));
        if res == lbool::TRUE {
            prop_assert!(satisfied_by(&cnf, |v| s.model_value(Lit::new(vars[v as usize], true)) == lbool::TRUE));
        }
    }

    #[test]
    fn prop_driven_search(
        (n, cnf) in cnf_strategy(),
        mask in any::<u8>(),
    ) {
        let (mut s, vars) = mk_solver(n, SolverOpts::default());
        for (i, &v) in vars.iter().enumerate() {
            s.set_reliable(v, mask & (1 << i) == 0);
        }
        for c in &cnf {
            s.add_clause(&lits(&vars, c));
        }
        let res = drive(&mut s, &vars);
        prop_assert_eq!(res == lbool::TRUE, brute_force(n, &cnf));
        if res == lbool::TRUE {
            prop_assert!(satisfied_by(&cnf, |v| s.value_var(vars[v as usize]) == lbool::TRUE));
        }
    }

    #[test]
    fn prop_lazy_decisions_with_unreliable_vars(
        (n, cnf) in cnf_strategy(),
        mask in any::<u8>(),
        width in 1..4usize,
    ) {
        let (mut s, vars) = mk_solver(n, SolverOpts::default());
        for (i, &v) in vars.iter().enumerate() {
            s.set_reliable(v, mask & (1 << i) == 0);
        }
        for c in &cnf {
            s.add_clause(&lits(&vars, c));
        }
        let res = drive_lazily(&mut s, &vars, width);
        prop_assert_eq!(res == lbool::TRUE, brute_force(n, &cnf));
        if res == lbool::TRUE {
            prop_assert!(satisfied_by(&cnf, |v| s.value_var(vars[v as usize]) == lbool::TRUE));
        }
    }

    #[test]
    fn prop_clauses_added_mid_search(
        (n, cnf) in cnf_strategy(),
        split in 0..30usize,
        decisions in prop::collection::vec((0..MAX_VARS, any::<bool>()), 0..4),
    ) {
        let (mut s, vars) = mk_solver(n, SolverOpts::default());
        let split = split.min(cnf.len());
        for c in &cnf[..split] {
            s.add_clause(&lits(&vars, c));
        }
        // open a few levels, then add the remaining clauses there
        for &(v, sign) in &decisions {
            if !s.propagate() {
                break;
            }
            let v = vars[(v % n) as usize];
            if s.value_var(v) == lbool::UNDEF {
                s.decide(Lit::new(v, sign));
            }
        }
        for c in &cnf[split..] {
            s.add_clause(&lits(&vars, c));
        }
        let res = drive(&mut s, &vars);
        prop_assert_eq!(res == lbool::TRUE, brute_force(n, &cnf));
        if res == lbool::TRUE {
            prop_assert!(satisfied_by(&cnf, |v| s.value_var(vars[v as usize]) == lbool::TRUE));
        }
    }
}
