/*****************************************************************************************[core.rs]
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

use {
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::channel::{Channel, ChannelInfo, VarSpec},
    crate::clause::{lbool, CRef, ClauseAllocator, ClauseRef, LMap, Lit, VMap, Var},
    crate::interface::SolverInterface,
    crate::intmap::{Comparator, Heap, HeapData, IntMapBool},
    std::{
        cmp, fmt, mem,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    },
};

#[cfg(feature = "logging")]
use crate::clause::display::Print;

/// The main solver structure
///
/// A `Solver` object contains the whole state of the SAT solver, including
/// a clause allocator, literals, clauses, and statistics.
///
/// It is parametrized by `Callbacks`
pub struct Solver<Cb: Callbacks> {
    /// If problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,

    cb: Cb, // the callbacks
    interrupt: Arc<AtomicBool>,
    budget: Budget,
    /// Conflicts and propagations at the start of the current `solve`.
    budget_base: (u64, u64),

    /// List of problem clauses.
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,

    v: SolverV,
    /// Conflict found by `propagate`, not resolved yet.
    confl: Option<CRef>,
    tmp_learnt: Vec<Lit>,
}

/// Resource caps for one call to `solve`.
///
/// Both counters start from zero at the beginning of each call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    pub conflicts: Option<u64>,
    pub propagations: Option<u64>,
}

impl Budget {
    /// No limit at all.
    pub fn unlimited() -> Self {
        Budget::default()
    }

    pub fn conflicts(n: u64) -> Self {
        Budget {
            conflicts: Some(n),
            propagations: None,
        }
    }

    pub fn propagations(n: u64) -> Self {
        Budget {
            conflicts: None,
            propagations: Some(n),
        }
    }
}

/// Why a variable has its current value.
///
/// Problem clauses of size 2 and 3 are not referenced, their other literals
/// are stored inline. All literals stored here are false in the current trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    /// Decision, or fact asserted at level 0
    Undef,
    Lit(Lit),
    Lits(Lit, Lit),
    /// The clause's first literal is the implied one
    Clause(CRef),
}

/// The current assignments.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// What each variable means to the CP layer.
    info: VMap<ChannelInfo>,
    /// Observer notified on each assignment, if any.
    channel: VMap<Option<Box<dyn Channel>>>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<u32>,
}

struct SolverV {
    vars: VarState,

    learntsize_adjust_start_confl: i32,
    learntsize_adjust_inc: f64,
    max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i32,

    remove_satisfied: bool,

    // Statistics: (read-only member variable)
    solves: u64,
    starts: u64,
    decisions: u64,
    rnd_decisions: u64,
    propagations: u64,
    conflicts: u64,
    dec_vars: u64,
    max_literals: u64,
    tot_literals: u64,
    /// Unreliable literals expanded away from learnt clauses.
    replaced_literals: u64,

    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,

    // Mode of operation:
    clause_decay: f64,
    random_var_freq: f64,
    random_seed: f64,
    luby_restart: bool,
    ccmin_mode: Minimization,
    phase_saving: PhaseSaving,
    /// Use random polarities for branching heuristics.
    rnd_pol: bool,
    /// Initialize variable activities with a small random value.
    rnd_init_act: bool,
    /// The fraction of wasted memory allowed before a garbage collection is triggered.
    garbage_frac: f64,
    /// Minimum number to set the learnts limit to.
    min_learnts_lim: i32,

    /// The initial restart limit. (default 100)
    restart_first: i32,
    /// The factor with which the restart limit is multiplied in each restart. (default 2)
    restart_inc: f64,
    /// The intitial limit for learnt clauses is a factor of the original clauses. (default 1 / 3)
    learntsize_factor: f64,
    /// The limit for learnt clauses is multiplied with this factor periodically. (default 1.1)
    learntsize_inc: f64,

    /// The preferred polarity of each variable.
    polarity: VMap<bool>,
    /// The users preferred polarity of each variable.
    user_pol: VMap<lbool>,
    /// Declares if a variable is eligible for selection in the decision heuristic.
    decision: VMap<bool>,
    /// `watches[lit]` is a list of constraints watching 'lit' (will go there if literal becomes true).
    watches: LMap<Vec<Watcher>>,
    /// A priority queue of variables ordered with respect to the variable activity.
    order_heap_data: HeapData<Var>,
    /// If `false`, the constraints are already unsatisfiable. No part of the solver state may be used!
    ok: bool,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of queue (as index into the trail).
    qhead: usize,
    /// Number of top-level assignments since last execution of 'simplify()'.
    simp_db_assigns: i64,
    /// Remaining number of propagations that must be made before next execution of 'simplify()'.
    simp_db_props: i64,
    /// Set by `search()`.
    progress_estimate: f64,

    /// Next variable to be created.
    next_var: Var,
    ca: ClauseAllocator,

    // Temporaries (to reduce allocation overhead).
    seen: IntMapBool<Var>,
    analyze_toclear: Vec<Lit>,
    reason_buf: Vec<Lit>,
}

pub struct SolverPrintDimacs<'a, Cb: Callbacks + 'a> {
    s: &'a Solver<Cb>,
}

mod dimacs {
    use super::*;

    impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            write!(out, "v ")?;
            for (i, &val) in self.s.model.iter().enumerate() {
                if val == lbool::TRUE {
                    write!(out, "{} ", i + 1)?
                } else if val == lbool::FALSE {
                    write!(out, "-{} ", i + 1)?
                }
            }
            writeln!(out, "0")
        }
    }
}

// public API
impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        self.new_var_with(VarSpec {
            polarity: upol,
            decision: dvar,
            ..VarSpec::default()
        })
    }

    fn new_var_default(&mut self) -> Var {
        self.new_var(lbool::UNDEF, true)
    }

    fn var_of_int(&mut self, v_idx: u32) -> Var {
        while v_idx >= self.num_vars() {
            self.new_var_default();
        }
        let var = Var::from_idx(v_idx);
        debug_assert_eq!(var.idx(), v_idx);
        var
    }

    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool {
        if !self.v.ok {
            return false;
        }
        if self.v.decision_level() == 0 {
            debug!("add toplevel clause {:?}", clause);
            clause.sort_unstable();
            self.add_clause_(clause)
        } else {
            self.add_clause_during_search(clause)
        }
    }

    fn simplify(&mut self) -> bool {
        assert_eq!(
            self.v.decision_level(),
            0,
            "simplify is only legal at level 0"
        );
        self.simplify_internal()
    }

    fn solve_limited(&mut self) -> lbool {
        self.solve_internal()
    }

    fn value_var(&self, v: Var) -> lbool {
        self.v.value(v)
    }
    fn value_lit(&self, lit: Lit) -> lbool {
        self.v.value_lit(lit)
    }
    fn get_model(&self) -> &[lbool] {
        &self.model
    }
    fn is_ok(&self) -> bool {
        self.v.ok
    }

    fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    fn num_clauses(&self) -> u64 {
        self.v.num_clauses
    }
    fn num_learnts(&self) -> u64 {
        self.v.num_learnts
    }
    fn num_conflicts(&self) -> u64 {
        self.v.conflicts
    }
    fn num_propagations(&self) -> u64 {
        self.v.propagations
    }
    fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        let mut res = self.v.value_lit(lit);
        if self.v.level(lit.var()) != 0 {
            res = lbool::UNDEF;
        }
        res
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        self.v.vars.proved_at_lvl_0()
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

// main algorithm
impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check(), "invalid solver options");
        Self {
            model: vec![],
            cb,
            interrupt: Arc::new(AtomicBool::new(false)),
            budget: Budget::default(),
            budget_base: (0, 0),
            clauses: vec![],
            learnts: vec![],
            v: SolverV::new(&opts),
            confl: None,
            tmp_learnt: vec![],
        }
    }

    /// Create a variable, possibly tied to a CP fact.
    pub fn new_var_with(&mut self, spec: VarSpec) -> Var {
        let v = self.v.new_var(spec);
        trace!("new var {:?}", v);
        v
    }

    /// What the CP layer told us about `v`.
    pub fn channel_info(&self, v: Var) -> ChannelInfo {
        self.v.vars.info[v]
    }

    pub fn is_reliable(&self, v: Var) -> bool {
        self.v.vars.is_reliable(v)
    }

    /// Change the reliability of `v`. Affects conflicts analyzed from now on.
    pub fn set_reliable(&mut self, v: Var, reliable: bool) {
        self.v.vars.info[v].reliable = reliable;
    }

    /// Replace the observer of `v`.
    pub fn set_channel(&mut self, v: Var, channel: Option<Box<dyn Channel>>) {
        self.v.vars.channel[v] = channel;
    }

    /// Declare if a variable should be eligible for selection in the decision heuristic.
    pub fn set_decision_var(&mut self, v: Var, b: bool) {
        self.v.set_decision_var(v, b)
    }

    /// Caps for the next calls to `solve`.
    pub fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Current decision level (0 is the root).
    pub fn decision_level(&self) -> u32 {
        self.v.decision_level()
    }

    /// Open a new decision level.
    pub fn push_trail_marker(&mut self) {
        self.v.vars.new_decision_level();
        trace!("new decision level {}", self.v.decision_level());
    }

    /// Open a new decision level and assign `p` in it.
    ///
    /// Precondition: `p` is unassigned.
    pub fn decide(&mut self, p: Lit) {
        debug_assert_eq!(self.v.value_lit(p), lbool::UNDEF);
        self.v.decisions += 1;
        self.push_trail_marker();
        trace!("decide {:?}", p);
        self.v.vars.unchecked_enqueue(p, Reason::Undef);
    }

    /// Run unit propagation to a fixpoint.
    ///
    /// Returns `false` if a conflict was found; call `resolve_conflict` to
    /// learn from it. A conflict at level 0 makes the solver unsat.
    pub fn propagate(&mut self) -> bool {
        if !self.v.ok || self.confl.is_some() {
            return false;
        }
        match self.v.propagate() {
            None => true,
            Some(cr) => {
                if self.v.decision_level() == 0 {
                    self.v.ok = false;
                } else {
                    self.confl = Some(cr);
                }
                false
            }
        }
    }

    /// Analyze the pending conflict, backtrack and assert the learnt clause.
    ///
    /// Returns `false` if the solver is unsat.
    pub fn resolve_conflict(&mut self) -> bool {
        let confl = match self.confl.take() {
            Some(cr) => cr,
            None => return self.v.ok,
        };
        self.v.conflicts += 1;
        debug_assert!(self.v.decision_level() > 0);
        self.learn_from_conflict(confl);
        self.v.ok
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    ///
    /// Does nothing if `level` is not below the current level.
    pub fn cancel_until(&mut self, level: u32) {
        if self.v.decision_level() > level {
            trace!("cancel-until {}", level);
            self.v.cancel_until(level);
            self.confl = None;
        }
    }

    fn simplify_internal(&mut self) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);

        if !self.v.ok || self.v.propagate().is_some() {
            self.v.ok = false;
            return false;
        }

        if self.v.num_assigns() as i64 == self.v.simp_db_assigns || self.v.simp_db_props > 0 {
            return true;
        }

        self.remove_satisfied(ClauseSetSelect::Learnt); // Remove satisfied learnt clauses
        if self.v.remove_satisfied {
            self.remove_satisfied(ClauseSetSelect::Original); // remove satisfied normal clauses
        }
        self.check_garbage();
        self.v.rebuild_order_heap();

        self.v.simp_db_assigns = self.v.num_assigns() as i64;
        // (shouldn't depend on stats really, but it will do for now)
        self.v.simp_db_props = (self.v.clauses_literals + self.v.learnts_literals) as i64;

        self.cb.on_simplify();
        true
    }

    /// Search for a model the specified number of conflicts.
    ///
    /// Use negative value for `nof_conflicts` indicate infinity.
    ///
    /// # Output:
    ///
    /// - `lbool::TRUE` if a partial assigment that is consistent with respect to the clauseset is found. If
    ///    all variables are decision variables, this means that the clause set is satisfiable.
    /// - `lbool::FALSE` if the clause set is unsatisfiable.
    /// - 'lbool::UNDEF` if the bound on number of conflicts is reached.
    fn search(&mut self, nof_conflicts: i32) -> lbool {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0;
        self.v.starts += 1;

        loop {
            // boolean propagation
            if let Some(confl) = self.v.propagate() {
                // conflict analysis
                self.v.conflicts += 1;
                conflict_c += 1;
                if self.v.decision_level() == 0 {
                    return lbool::FALSE;
                }

                self.learn_from_conflict(confl);
                if !self.v.ok {
                    return lbool::FALSE;
                }

                self.v.learntsize_adjust_cnt -= 1;
                if self.v.learntsize_adjust_cnt == 0 {
                    self.v.learntsize_adjust_confl *= self.v.learntsize_adjust_inc;
                    self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
                    self.v.max_learnts *= self.v.learntsize_inc;

                    let trail_lim_head = self
                        .v
                        .vars
                        .trail_lim
                        .first()
                        .cloned()
                        .unwrap_or(self.v.vars.trail.len() as u32);
                    let v = &self.v;
                    self.cb.on_progress(|| ProgressStatus {
                        conflicts: v.conflicts,
                        dec_vars: v.dec_vars.saturating_sub(trail_lim_head as u64),
                        n_clauses: v.num_clauses,
                        n_clause_lits: v.clauses_literals,
                        max_learnt: v.max_learnts as u64,
                        n_learnt: v.num_learnts,
                        n_learnt_lits: v.learnts_literals as f64 / v.num_learnts.max(1) as f64,
                        progress_estimate: v.progress_estimate() * 100.0,
                    });
                }
            } else {
                // no boolean conflict
                if (nof_conflicts >= 0 && conflict_c >= nof_conflicts) || !self.within_budget() {
                    // Reached bound on number of conflicts:
                    self.v.progress_estimate = self.v.progress_estimate();
                    self.cancel_until(0);
                    return lbool::UNDEF;
                }

                // Simplify the set of problem clauses:
                if self.v.decision_level() == 0 && !self.simplify_internal() {
                    return lbool::FALSE;
                }

                if self.learnts.len() as f64 - self.v.num_assigns() as f64 >= self.v.max_learnts {
                    // Reduce the set of learnt clauses:
                    self.reduce_db();
                }

                let next = self.v.pick_branch_lit();
                if next == Lit::UNDEF {
                    // Model found:
                    return lbool::TRUE;
                }

                // Increase decision level and enqueue `next`
                // with no justification since it's a decision
                self.decide(next);
            }
        }
    }

    /// Analyze `confl`, backtrack, and assert the learnt clause.
    fn learn_from_conflict(&mut self, confl: CRef) {
        let mut learnt = mem::replace(&mut self.tmp_learnt, vec![]);
        let btlevel = self.v.analyze(confl, &self.learnts, &mut learnt);
        self.add_learnt_and_backtrack(&learnt, btlevel);
        self.tmp_learnt = learnt;

        self.v.vars.var_decay_activity();
        self.v.cla_decay_activity();
    }

    /// Add a learnt clause and backtrack/propagate as necessary
    fn add_learnt_and_backtrack(&mut self, learnt: &[Lit], btlevel: u32) {
        #[cfg(feature = "logging")]
        debug!("learnt {} (backtrack to {})", learnt.pp_dimacs(), btlevel);
        self.cancel_until(btlevel);

        if learnt.is_empty() {
            self.v.ok = false;
            return;
        }

        // propagate the only lit of `learnt` that isn't false
        if learnt.len() == 1 {
            // directly propagate the unit clause at level 0
            debug_assert_eq!(btlevel, 0);
            self.v.vars.unchecked_enqueue(learnt[0], Reason::Undef);
        } else {
            // propagate the lit, justified by `cr`
            let cr = self.v.ca.alloc_with_learnt(learnt, true);
            self.learnts.push(cr);
            self.v.attach_clause(cr);
            self.v.cla_bump_activity(&self.learnts, cr);
            let reason = self.v.clause_reason(cr);
            self.v.vars.unchecked_enqueue(learnt[0], reason);
        }
    }

    fn solve_internal(&mut self) -> lbool {
        self.model.clear();
        if !self.v.ok {
            return lbool::FALSE;
        }
        self.cancel_until(0);
        self.confl = None;

        self.v.solves += 1;
        self.budget_base = (self.v.conflicts, self.v.propagations);

        self.v.max_learnts = self.v.num_clauses as f64 * self.v.learntsize_factor;
        if self.v.max_learnts < self.v.min_learnts_lim as f64 {
            self.v.max_learnts = self.v.min_learnts_lim as f64;
        }

        self.v.learntsize_adjust_confl = self.v.learntsize_adjust_start_confl as f64;
        self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
        let mut status;

        info!("search.start");
        self.cb.on_start();

        // Search:
        let mut curr_restarts: i32 = 0;
        loop {
            let rest_base = if self.v.luby_restart {
                utils::luby(self.v.restart_inc, curr_restarts)
            } else {
                f64::powi(self.v.restart_inc, curr_restarts)
            };
            let nof_conflicts = (rest_base * self.v.restart_first as f64) as i32;
            status = self.search(nof_conflicts);
            if !self.within_budget() {
                break;
            }

            if status != lbool::UNDEF {
                break;
            } else {
                info!("search.restart({})", curr_restarts);
                curr_restarts += 1;
                self.cb.on_restart();
            }
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            // copy model:
            let num_vars = self.num_vars();
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.v.value(Var::from_idx(i));
            }
        } else if status == lbool::FALSE {
            self.v.ok = false;
        }

        self.cancel_until(0);
        self.interrupt.store(false, Ordering::SeqCst);
        info!("search.result {:?}", status);
        status
    }

    /// Remove half of the learnt clauses, minus the clauses locked by the current assignment. Locked
    /// clauses are clauses that are reason to some assignment. Binary clauses are never removed.
    fn reduce_db(&mut self) {
        let extra_lim = self.v.cla_inc / self.learnts.len() as f64; // Remove any clause below this activity

        debug!("reduce_db.start");

        {
            let ca = &self.v.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                debug_assert!(x.learnt());
                debug_assert!(y.learnt());
                Ord::cmp(&(x.size() <= 2), &(y.size() <= 2)).then(
                    PartialOrd::partial_cmp(&x.activity(), &y.activity()).expect("NaN activity"),
                )
            });
        }
        // Don't delete binary or locked clauses. From the rest, delete clauses from the first half
        // and clauses with activity smaller than `extra_lim`:
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let cr = self.learnts[i];
            let cond = {
                let c = self.v.ca.get_ref(cr);
                c.size() > 2
                    && !self.v.locked(cr)
                    && (i < self.learnts.len() / 2 || (c.activity() as f64) < extra_lim)
            };
            if cond {
                self.v.remove_clause(cr);
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }

        let _deleted = self.learnts.len() - j;
        self.learnts.truncate(j);

        debug!("reduce_db.done (deleted {})", _deleted);
        debug_assert!(self.v.reasons_are_live());

        self.check_garbage();
    }

    /// Shrink the given set to contain only non-satisfied clauses.
    fn remove_satisfied(&mut self, which: ClauseSetSelect) {
        assert_eq!(self.v.decision_level(), 0);
        let cs: &mut Vec<CRef> = match which {
            ClauseSetSelect::Learnt => &mut self.learnts,
            ClauseSetSelect::Original => &mut self.clauses,
        };
        let self_v = &mut self.v;
        cs.retain(|&cr| {
            let satisfied = self_v.satisfied(self_v.ca.get_ref(cr));
            if satisfied {
                trace!("remove satisfied clause {:?}", self_v.ca.get_ref(cr).lits());
                self_v.remove_clause(cr);
            } else {
                let learnt = self_v.ca.get_ref(cr).learnt();
                let (orig_size, new_size) = {
                    let mut c = self_v.ca.get_mut(cr);
                    // Trim clause (but keep the 2 first lits as they are watching):
                    debug_assert_eq!(self_v.vars.value_lit(c[0]), lbool::UNDEF);
                    debug_assert_eq!(self_v.vars.value_lit(c[1]), lbool::UNDEF);
                    let mut k = 2;
                    let orig_size = c.size();
                    let mut end = c.size();
                    while k < end {
                        if self_v.vars.value_lit(c[k]) == lbool::FALSE {
                            // this lit is false at level 0, remove it from `c`
                            debug_assert_eq!(self_v.vars.level(c[k].var()), 0);
                            end -= 1;
                            c[k] = c[end];
                        } else {
                            k += 1;
                        }
                    }
                    (orig_size, end)
                };
                if new_size < orig_size {
                    self_v.ca.shrink(cr, new_size);
                    let shaved = (orig_size - new_size) as u64;
                    if learnt {
                        self_v.learnts_literals -= shaved;
                    } else {
                        self_v.clauses_literals -= shaved;
                    }
                }
            }
            !satisfied
        });
    }

    /// Garbage collect the clause allocator by moving alive clauses into
    /// another allocator.
    fn garbage_collect(&mut self) {
        // Initialize the next region to a size corresponding to the estimated utilization degree. This
        // is not precise but should avoid some unnecessary reallocations for the new region:
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());

        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);

        debug!(
            "garbage collection: {} -> {} words",
            self.v.ca.len(),
            to.len()
        );
        self.cb.on_gc(
            (self.v.ca.len() * ClauseAllocator::UNIT_SIZE) as usize,
            (to.len() * ClauseAllocator::UNIT_SIZE) as usize,
        );
        self.v.ca = to;
    }

    /// Check whether the space wasted by dead clauses in the clause allocator exceeds
    /// the threshold
    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac {
            self.garbage_collect();
        }
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    /// Display the last model as a DIMACS `v` line.
    pub fn dimacs_model(&self) -> SolverPrintDimacs<Cb> {
        SolverPrintDimacs { s: self }
    }

    /// Interrupt search asynchronously
    pub fn interrupt_async(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }

    /// A handle that other threads can use to interrupt the search.
    ///
    /// The flag is cleared when `solve` returns.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    fn within_budget(&self) -> bool {
        let (confl_base, props_base) = self.budget_base;
        !self.interrupt.load(Ordering::Relaxed)
            && self
                .budget
                .conflicts
                .map_or(true, |n| self.v.conflicts - confl_base < n)
            && self
                .budget
                .propagations
                .map_or(true, |n| self.v.propagations - props_base < n)
            && !self.cb.stop()
    }

    /// Print some current statistics to standard output.
    pub fn print_stats(&self) {
        println!("c restarts              : {}", self.v.starts);
        println!("c conflicts             : {:<12}", self.v.conflicts);
        println!(
            "c decisions             : {:<12}   ({:4.2} % random)",
            self.v.decisions,
            self.v.rnd_decisions as f32 * 100.0 / self.v.decisions.max(1) as f32
        );
        println!("c propagations          : {:<12}", self.v.propagations);
        println!(
            "c conflict literals     : {:<12}   ({:4.2} % deleted)",
            self.v.tot_literals,
            (self.v.max_literals - self.v.tot_literals) as f64 * 100.0
                / self.v.max_literals.max(1) as f64
        );
        println!("c replaced literals     : {:<12}", self.v.replaced_literals);
    }

    /// Add clause at level 0.
    ///
    /// Precondition: `clause` is sorted for some ordering on `Lit`
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        if !self.normalize_clause(clause) {
            return true; // tauto or satisfied already at level 0
        }

        if clause.len() == 0 {
            self.v.ok = false;
            false
        } else if clause.len() == 1 {
            self.v.vars.unchecked_enqueue(clause[0], Reason::Undef);
            if self.v.propagate().is_some() {
                self.v.ok = false;
                return false;
            }
            true
        } else {
            let cr = self.v.ca.alloc_with_learnt(&clause, false);
            self.clauses.push(cr);
            self.v.attach_clause(cr);
            true
        }
    }

    /// Remove duplicates and literals false at level 0.
    ///
    /// Returns `false` if the clause is a tautology or already satisfied at level 0.
    /// Precondition: `clause` is sorted.
    fn normalize_clause(&self, clause: &mut Vec<Lit>) -> bool {
        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.value_lit(lit_i);
            let at_root = value != lbool::UNDEF && self.v.level_lit(lit_i) == 0;
            if (value == lbool::TRUE && at_root) || lit_i == !last_lit {
                return false;
            } else if !(value == lbool::FALSE && at_root) && lit_i != last_lit {
                // not a duplicate
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }
        clause.truncate(j);
        true
    }

    /// Add clause during search.
    ///
    /// Backtracks to the highest level where the clause is not falsified, and
    /// asserts its first literal if it is unit there.
    fn add_clause_during_search(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug!("add clause {:?} at level {}", clause, self.v.decision_level());
        clause.sort_unstable();
        if !self.normalize_clause(clause) {
            return true;
        }

        match clause.len() {
            0 => {
                self.v.ok = false;
                false
            }
            1 => {
                self.cancel_until(0); // only at level 0
                self.v.vars.unchecked_enqueue(clause[0], Reason::Undef);
                if self.v.propagate().is_some() {
                    self.v.ok = false;
                    return false;
                }
                true
            }
            _ => {
                self.v.sort_clause_lits(clause);
                let (c0, c1) = (clause[0], clause[1]);
                let (val0, val1) = (self.v.value_lit(c0), self.v.value_lit(c1));
                let (lvl0, lvl1) = (self.v.level_lit(c0), self.v.level_lit(c1));

                // level where the clause becomes unit, if it does
                let mut assert_at = None;
                if val1 == lbool::FALSE {
                    if val0 == lbool::FALSE && lvl0 == lvl1 {
                        // falsified, and no literal is alone at its level
                        self.cancel_until(lvl1 - 1);
                    } else if val0 == lbool::UNDEF || lvl0 > lvl1 {
                        assert_at = Some(lvl1);
                    }
                }
                if let Some(lvl) = assert_at {
                    self.cancel_until(lvl);
                }

                let cr = self.v.ca.alloc_with_learnt(&clause, false);
                self.clauses.push(cr);
                self.v.attach_clause(cr);
                if assert_at.is_some() {
                    let reason = self.v.clause_reason(cr);
                    self.v.vars.unchecked_enqueue(c0, reason);
                }
                true
            }
        }
    }
}

impl SolverV {
    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }

    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }

    #[inline(always)]
    pub fn level(&self, x: Var) -> u32 {
        self.vars.level(x)
    }

    #[inline(always)]
    pub fn level_lit(&self, x: Lit) -> u32 {
        self.level(x.var())
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    pub fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        if b && !self.decision[v] {
            self.dec_vars += 1;
        } else if !b && self.decision[v] {
            self.dec_vars -= 1;
        }
        self.decision[v] = b;
        self.insert_var_order(v);
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap().in_heap(x) && self.decision[x] {
            self.order_heap().insert(x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let r = c.activity() + self.cla_inc as f32;
            c.set_activity(r);
            r
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let mut c = self.ca.get_mut(learnt);
                let r = c.activity() * 1e-20;
                c.set_activity(r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Pick a literal to make a decision with
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;

        // Random decision:
        if utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap_data.is_empty()
        {
            let idx_tmp =
                utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32) as usize;
            next = self.order_heap_data[idx_tmp];
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.rnd_decisions += 1;
            }
        }

        // Activity based decision:
        while next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            match self.order_heap().remove_min() {
                Some(v) => next = v,
                None => {
                    next = Var::UNDEF;
                    break;
                }
            }
        }

        // Choose polarity based on different polarity modes (global or per-variable):
        if next == Var::UNDEF {
            Lit::UNDEF
        } else if self.user_pol[next] != lbool::UNDEF {
            Lit::new(next, self.user_pol[next] == lbool::TRUE)
        } else if self.rnd_pol {
            Lit::new(next, utils::drand(&mut self.random_seed) < 0.5)
        } else {
            Lit::new(next, self.polarity[next])
        }
    }

    fn new_var(&mut self, spec: VarSpec) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(self.next_var.idx() + 1);

        self.watches.insert_default(Lit::new(v, false), vec![]);
        self.watches.insert_default(Lit::new(v, true), vec![]);
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars.vardata.insert_default(v, VarData::default());
        if self.rnd_init_act {
            let act = utils::drand(&mut self.random_seed) * 0.00001;
            self.vars.activity.insert_default(v, act);
        } else {
            self.vars.activity.insert_default(v, 0.0);
        }
        self.vars.info.insert_default(v, spec.info);
        self.vars.channel.insert_default(v, spec.channel);
        self.seen.reserve(v);
        self.polarity.insert_default(v, false);
        self.user_pol.insert_default(v, spec.polarity);
        self.decision.reserve_default(v);
        self.set_decision_var(v, spec.decision);
        v
    }

    /// How `c[0]` is justified when `cr` propagates it.
    ///
    /// Learnt clauses are always referenced, so that analysis can bump them.
    fn clause_reason(&self, cr: CRef) -> Reason {
        let c = self.ca.get_ref(cr);
        match c.size() {
            _ if c.learnt() => Reason::Clause(cr),
            2 => Reason::Lit(c[1]),
            3 => Reason::Lits(c[1], c[2]),
            _ => Reason::Clause(cr),
        }
    }

    /// Fill `out` with the false literals justifying a variable that has reason `r`.
    fn reason_lits(&self, r: Reason, out: &mut Vec<Lit>) {
        out.clear();
        match r {
            Reason::Undef => (),
            Reason::Lit(a) => out.push(a),
            Reason::Lits(a, b) => {
                out.push(a);
                out.push(b);
            }
            Reason::Clause(cr) => out.extend_from_slice(&self.ca.get_ref(cr).lits()[1..]),
        }
    }

    /// Analyze conflict and produce a reason clause.
    ///
    /// # Pre-conditions:
    ///
    /// - current decision level must be greater than root level.
    /// - `confl` is false in the current trail
    ///
    /// # Post-conditions:
    ///
    /// - the backtrack level is returned.
    /// - `out_learnt` is empty if the conflict only depends on level 0.
    /// - `out_learnt[0]` is the asserting literal at the backtrack level.
    /// - if `out_learnt.len() > 1` then `out_learnt[1]` has the greatest decision level of the
    ///   rest of literals. There may be others from the same level though.
    /// - no literal of `out_learnt` but the first is unreliable, unless it is a decision.
    fn analyze(&mut self, confl: CRef, learnts: &[CRef], out_learnt: &mut Vec<Lit>) -> u32 {
        out_learnt.clear();
        debug_assert!(self.seen.is_clear());

        let mut conflict_level = self.decision_level();
        trace!("analyze.start {:?} at level {}", confl, conflict_level);

        let mut path_c = 0;
        let mut p = Lit::UNDEF;
        let mut reason = Reason::Clause(confl);

        out_learnt.push(Lit::UNDEF); // leave room for the UIP

        let mut index = self.vars.trail.len();

        loop {
            let buf: [Lit; 2];
            let lits: &[Lit] = match reason {
                Reason::Undef => {
                    // should have `path_c==0`
                    panic!(
                        "analyze: reached a decision literal {:?}, path_c={}",
                        p, path_c
                    );
                }
                Reason::Lit(a) => {
                    buf = [a, a];
                    &buf[..1]
                }
                Reason::Lits(a, b) => {
                    buf = [a, b];
                    &buf[..]
                }
                Reason::Clause(cr) => {
                    // bump activity if `cr` is a learnt clause
                    if self.ca.get_ref(cr).learnt() {
                        self.cla_bump_activity(learnts, cr);
                    }
                    let lits = self.ca.get_ref(cr).lits();
                    if p == Lit::UNDEF {
                        // the conflict itself
                        lits
                    } else {
                        // `p` is the first literal, it can't be in the learnt clause
                        debug_assert_eq!(lits[0], p);
                        &lits[1..]
                    }
                }
            };

            for &q in lits {
                let x = q.var();
                let lvl = self.vars.level(x);
                debug_assert!(lvl <= conflict_level);
                if !self.seen[x] && lvl > 0 {
                    self.vars.var_bump_activity(&mut self.order_heap_data, x);
                    self.seen.set(x, true);
                    if lvl == conflict_level {
                        // at conflict level: need to eliminate this lit by resolution
                        path_c += 1;
                    } else {
                        out_learnt.push(q); // part of the learnt clause
                    }
                }
            }

            if path_c == 0 {
                // Everything left was assigned below `conflict_level`. This
                // happens when a level is opened before the queue is empty.
                // Resume the walk at the highest level left in the clause.
                conflict_level = out_learnt[1..]
                    .iter()
                    .map(|l| self.vars.level(l.var()))
                    .max()
                    .unwrap_or(0);
                if conflict_level == 0 {
                    // the conflict follows from root facts only
                    trace!("analyze: conflict holds at level 0");
                    debug_assert!(self.seen.is_clear());
                    out_learnt.clear();
                    return 0;
                }
                trace!("analyze: resume at level {}", conflict_level);
                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let q = out_learnt[i];
                    if self.vars.level(q.var()) == conflict_level {
                        path_c += 1;
                    } else {
                        out_learnt[j] = q;
                        j += 1;
                    }
                }
                out_learnt.truncate(j);
            }

            // Select next literal in the trail to look at:
            while !self.seen[self.vars.trail[index - 1].var()] {
                index -= 1;
            }
            p = self.vars.trail[index - 1];
            index -= 1;
            reason = self.vars.reason(p.var());
            self.seen.set(p.var(), false);
            path_c -= 1;

            if path_c <= 0 {
                if self.vars.is_reliable(p.var()) || reason == Reason::Undef {
                    break;
                }
                // an unreliable UIP is resolved away like any other literal
                trace!("analyze: skip unreliable uip {:?}", p);
            }
        }

        debug_assert!(self.value_lit(p) == lbool::TRUE);
        out_learnt[0] = !p;

        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(&out_learnt[1..]);

        self.replace_unreliable_lits(out_learnt);

        self.max_literals += out_learnt.len() as u64;
        self.minimize_conflict(out_learnt);

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            let mut max_level = self.level(out_learnt[max_i].var());
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                let level = self.level(out_learnt[i].var());
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(max_i, 1);
            max_level
        };

        for &lit in &self.analyze_toclear {
            self.seen.set(lit.var(), false); // (`seen[]` is now cleared)
        }
        debug_assert!(out_learnt
            .iter()
            .all(|&l| self.value_lit(l) == lbool::FALSE));
        debug_assert!(out_learnt[1..].iter().all(|&l| self
            .vars
            .is_reliable(l.var())
            || self.vars.reason(l.var()) == Reason::Undef));
        btlevel
    }

    /// Replace each unreliable literal of `out_learnt[1..]` by the literals
    /// of its reason, transitively.
    ///
    /// Unreliable decisions have nothing to be replaced with and stay.
    /// Every literal added is marked in `seen` and recorded in `analyze_toclear`.
    fn replace_unreliable_lits(&mut self, out_learnt: &mut Vec<Lit>) {
        let mut buf = mem::replace(&mut self.reason_buf, vec![]);
        let mut i = 1;
        while i < out_learnt.len() {
            let q = out_learnt[i];
            let x = q.var();
            let reason = self.vars.reason(x);
            if self.vars.is_reliable(x) || reason == Reason::Undef {
                i += 1;
                continue;
            }

            // `q` stays marked so it is never added back
            out_learnt.swap_remove(i);
            self.replaced_literals += 1;
            self.reason_lits(reason, &mut buf);
            trace!("analyze: replace unreliable {:?} by {:?}", q, buf);
            for &r in buf.iter() {
                let y = r.var();
                if !self.seen[y] && self.vars.level(y) > 0 {
                    self.seen.set(y, true);
                    self.vars.var_bump_activity(&mut self.order_heap_data, y);
                    self.analyze_toclear.push(r);
                    out_learnt.push(r);
                }
            }
        }
        self.reason_buf = buf;
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        let new_size = match self.ccmin_mode {
            Minimization::None => out_learnt.len(),
            Minimization::Basic => {
                let mut buf = mem::replace(&mut self.reason_buf, vec![]);
                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let lit = out_learnt[i];
                    let reason = self.vars.reason(lit.var());

                    // keep `lit` unless all of its reason is already in the clause
                    let retain = reason == Reason::Undef || {
                        self.reason_lits(reason, &mut buf);
                        buf.iter()
                            .any(|&q| !self.seen[q.var()] && self.level(q.var()) > 0)
                    };
                    if retain {
                        out_learnt[j] = lit;
                        j += 1;
                    }
                }
                self.reason_buf = buf;
                j
            }
        };

        self.tot_literals += new_size as u64;
        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// Propagates all enqueued facts. If a conflict arises, the conflicting clause is returned,
    /// otherwise `None`.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn propagate(&mut self) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while self.qhead < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead];
            self.qhead += 1;
            num_props += 1;

            // the list is put back once compacted
            let mut ws = mem::replace(&mut self.watches[p], vec![]);
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            'clauses: while i < end {
                // Try to avoid inspecting the clause:
                let blocker = ws[i].blocker;
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                // Make sure the false literal is data[1]:
                let cr = ws[i].cref;
                let mut c = self.ca.get_mut(cr);
                let false_lit = !p;
                if c[0] == false_lit {
                    c[0] = c[1];
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // If 0th watch is true, then clause is already satisfied.
                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                // Look for new watch:
                for k in 2..c.size() {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        c[1] = c[k];
                        c[k] = false_lit;

                        // `!c[1] != p`, since `c[1]` is not false
                        debug_assert_ne!(!c[1], p);
                        self.watches[!c[1]].push(w);
                        continue 'clauses;
                    }
                }

                // Did not find watch -- clause is unit under assignment:
                ws[j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len();
                    // Copy the remaining watches:
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    let reason = match c.size() {
                        _ if c.learnt() => Reason::Clause(cr),
                        2 => Reason::Lit(c[1]),
                        3 => Reason::Lits(c[1], c[2]),
                        _ => Reason::Clause(cr),
                    };
                    self.vars.unchecked_enqueue(first, reason);
                }
            }
            ws.truncate(j);
            debug_assert!(self.watches[p].is_empty());
            self.watches[p] = ws;
        }
        self.propagations += num_props as u64;
        self.simp_db_props -= num_props as i64;

        confl
    }

    fn rebuild_order_heap(&mut self) {
        let mut vs = vec![];
        for v in (0..self.num_vars()).map(Var::from_idx) {
            if self.decision[v] && self.value(v) == lbool::UNDEF {
                vs.push(v);
            }
        }
        self.order_heap().build(&vs);
    }

    /// Sort literals of `clause` so that unassigned literals are first,
    /// followed by literals in decreasing assignment level
    fn sort_clause_lits(&self, clause: &mut [Lit]) {
        clause.sort_unstable_by(|&lit1, &lit2| {
            let has_val1 = self.value_lit(lit1) != lbool::UNDEF;
            let has_val2 = self.value_lit(lit2) != lbool::UNDEF;

            // unassigned variables come first
            if has_val1 && !has_val2 {
                return cmp::Ordering::Greater;
            }
            if !has_val1 && has_val2 {
                return cmp::Ordering::Less;
            }
            if !has_val1 {
                return lit1.cmp(&lit2);
            }

            let lvl1 = self.level_lit(lit1);
            let lvl2 = self.level_lit(lit2);
            if lvl1 != lvl2 {
                lvl2.cmp(&lvl1) // higher level come first
            } else {
                lit1.cmp(&lit2) // otherwise default comparison
            }
        });
    }

    /// Move to the given clause allocator, where clause indices might differ
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        macro_rules! is_removed {
            ($ca:expr, $cr:expr) => {
                $ca.get_ref($cr).mark() == 1
            };
        }
        // All watchers:
        for v in (0..self.num_vars()).map(Var::from_idx) {
            for &sign in &[false, true] {
                let p = Lit::new(v, sign);
                for watch in self.watches[p].iter_mut() {
                    debug_assert!(!is_removed!(self.ca, watch.cref));
                    self.ca.reloc(&mut watch.cref, to);
                }
            }
        }

        // All reasons:
        for &lit in &self.vars.trail {
            let v = lit.var();
            if let Reason::Clause(mut cr) = self.vars.vardata[v].reason {
                if is_removed!(self.ca, cr) {
                    debug_assert_eq!(self.vars.vardata[v].level, 0);
                    self.vars.vardata[v].reason = Reason::Undef;
                } else {
                    self.ca.reloc(&mut cr, to);
                    self.vars.vardata[v].reason = Reason::Clause(cr);
                }
            }
        }

        // All learnt:
        {
            let ca = &mut self.ca;
            learnts.retain(|&cr| !is_removed!(ca, cr));
            for cr in learnts.iter_mut() {
                ca.reloc(cr, to);
            }
        }

        // All original:
        {
            let ca = &mut self.ca;
            clauses.retain(|&cr| !is_removed!(ca, cr));
            for cr in clauses.iter_mut() {
                ca.reloc(cr, to);
            }
        }
    }

    /// Attach a clause to watcher lists
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches[!c0].push(Watcher::new(cr, c1));
        self.watches[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until(&mut self, level: u32) {
        debug_assert!(self.decision_level() > level);
        let trail_lim_last = self.vars.trail_lim[self.vars.trail_lim.len() - 1] as usize;
        let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
        for c in (trail_lim_level..self.vars.trail.len()).rev() {
            let x = self.vars.trail[c].var();
            self.vars.ass[x] = lbool::UNDEF;
            let save = match self.phase_saving {
                PhaseSaving::Full => true,
                PhaseSaving::Limited => c > trail_lim_last,
                PhaseSaving::None => false,
            };
            if save {
                self.polarity[x] = self.vars.trail[c].sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = trail_lim_level;
        self.vars.trail.truncate(trail_lim_level);
        self.vars.trail_lim.truncate(level as usize);
    }

    /// Detach a clause from watcher lists.
    fn detach_clause(&mut self, cr: CRef) {
        let (c0, c1, csize, clearnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size(), c.learnt())
        };
        debug_assert!(csize > 1);

        for &w in &[!c0, !c1] {
            let ws = &mut self.watches[w];
            let pos = ws
                .iter()
                .position(|x| x.cref == cr)
                .expect("Watcher not found");
            ws.remove(pos);
        }

        if clearnt {
            self.num_learnts -= 1;
            self.learnts_literals -= csize as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= csize as u64;
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr);
        {
            // Don't leave pointers to free'd memory!
            let c0 = self.ca.get_ref(cr)[0];
            if self.reason(c0.var()) == Reason::Clause(cr) && self.value_lit(c0) == lbool::TRUE {
                self.vars.vardata[c0.var()].reason = Reason::Undef;
            }
        }
        self.ca.get_mut(cr).set_mark(1); // used in reloc
        self.ca.free(cr);
    }

    pub fn satisfied(&self, c: ClauseRef) -> bool {
        c.iter().any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> Reason {
        self.vars.reason(x)
    }

    /// Returns `true` if a clause is a reason for some implication in the current state.
    ///
    /// Small clauses are recognized by the literals they left in the reason.
    fn locked(&self, cr: CRef) -> bool {
        let c = self.ca.get_ref(cr);
        if self.value_lit(c[0]) != lbool::TRUE {
            return false;
        }
        match self.reason(c[0].var()) {
            Reason::Undef => false,
            Reason::Clause(r) => r == cr,
            Reason::Lit(a) => c.size() == 2 && a == c[1],
            Reason::Lits(a, b) => {
                c.size() == 3 && ((a == c[1] && b == c[2]) || (a == c[2] && b == c[1]))
            }
        }
    }

    /// Every clause used as a reason on the trail is still alive.
    fn reasons_are_live(&self) -> bool {
        self.vars.trail.iter().all(|&lit| match self.reason(lit.var()) {
            Reason::Clause(cr) => self.ca.get_ref(cr).mark() == 0,
            _ => true,
        })
    }

    fn progress_estimate(&self) -> f64 {
        let mut progress = 0.0;
        let f = 1.0 / self.num_vars().max(1) as f64;

        for i in 0..self.decision_level() + 1 {
            let beg = if i == 0 {
                0
            } else {
                self.vars.trail_lim[i as usize - 1]
            };
            let end = if i == self.decision_level() {
                self.vars.trail.len() as u32
            } else {
                self.vars.trail_lim[i as usize]
            };
            progress += f64::powi(f, i as i32) * (end - beg) as f64;
        }

        progress / self.num_vars().max(1) as f64
    }

    fn new(opts: &SolverOpts) -> Self {
        Self {
            vars: VarState::new(opts),
            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,

            clause_decay: opts.clause_decay,
            random_var_freq: opts.random_var_freq,
            random_seed: opts.random_seed,
            luby_restart: opts.luby_restart,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            rnd_pol: opts.rnd_pol,
            rnd_init_act: opts.rnd_init_act,
            garbage_frac: opts.garbage_frac,
            min_learnts_lim: opts.min_learnts_lim,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,
            learntsize_factor: opts.learntsize_factor,
            learntsize_inc: opts.learntsize_inc,
            remove_satisfied: opts.remove_satisfied,

            // Parameters (experimental):
            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,

            // Statistics:
            solves: 0,
            starts: 0,
            decisions: 0,
            rnd_decisions: 0,
            propagations: 0,
            conflicts: 0,
            dec_vars: 0,
            max_literals: 0,
            tot_literals: 0,
            replaced_literals: 0,

            polarity: VMap::new(),
            user_pol: VMap::new(),
            decision: VMap::new(),
            watches: LMap::new(),
            order_heap_data: HeapData::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,
            simp_db_assigns: -1,
            simp_db_props: 0,
            progress_estimate: 0.0,
            next_var: Var::from_idx(0),

            ca: ClauseAllocator::new(),

            seen: IntMapBool::new(),
            analyze_toclear: vec![],
            reason_buf: vec![],
            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,
        }
    }
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            info: VMap::new(),
            channel: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as u32;
        self.trail_lim.push(lvl);
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        // find where the end of the level-0 part of the trail is
        let end = self
            .trail_lim
            .get(0)
            .map_or(self.trail.len(), |&x| x as usize);
        &self.trail[..end]
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> u32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> Reason {
        self.vardata[x].reason
    }

    #[inline(always)]
    fn is_reliable(&self, x: Var) -> bool {
        self.info[x].reliable
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    /// Assign `p`, and let its observer know.
    fn unchecked_enqueue(&mut self, p: Lit, from: Reason) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        let x = p.var();
        self.ass[x] = lbool::new(p.sign());
        self.vardata[x] = VarData::new(from, self.decision_level());
        self.trail.push(p);
        if let Some(ch) = self.channel[x].as_mut() {
            ch.notify(x, p.sign());
        }
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Update order_heap with respect to new activity:
        let mut order_heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if order_heap.in_heap(v) {
            order_heap.decrease(v);
        }
    }
}

#[derive(Debug)]
enum ClauseSetSelect {
    Original,
    Learnt,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: Reason,
    level: u32,
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    blocker: Lit,
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

mod utils {
    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        f64::powi(y, seq)
    }

    /// Generate a random double:
    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        *seed / 2147483647.0
    }

    /// Generate a random integer:
    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: Reason::Undef,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    fn new(reason: Reason, level: u32) -> Self {
        Self { reason, level }
    }
}

impl PartialEq for Watcher {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.cref == rhs.cref
    }
}
impl Eq for Watcher {}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs]).expect("NaN activity")
    }
}

impl Watcher {
    fn new(cref: CRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

/// Conflict clause minimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Minimization {
    None,
    /// Remove literals whose reason is entirely made of clause literals
    Basic,
}

impl Minimization {
    /// From the command-line encoding (0=none, 1=basic).
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            0 => Some(Minimization::None),
            1 => Some(Minimization::Basic),
            _ => None,
        }
    }
}

/// When to remember the polarity of unassigned variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSaving {
    None,
    /// Only for the last decision level being undone
    Limited,
    Full,
}

impl PhaseSaving {
    /// From the command-line encoding (0=none, 1=limited, 2=full).
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            0 => Some(PhaseSaving::None),
            1 => Some(PhaseSaving::Limited),
            2 => Some(PhaseSaving::Full),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverOpts {
    pub var_decay: f64,
    pub clause_decay: f64,
    pub random_var_freq: f64,
    pub random_seed: f64,
    pub ccmin_mode: Minimization,
    pub phase_saving: PhaseSaving,
    pub rnd_pol: bool,
    pub rnd_init_act: bool,
    pub luby_restart: bool,
    pub restart_first: i32,
    pub restart_inc: f64,
    pub garbage_frac: f64,
    pub min_learnts_lim: i32,
    pub learntsize_factor: f64,
    pub learntsize_inc: f64,
    /// Also remove satisfied problem clauses in `simplify`.
    pub remove_satisfied: bool,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: Minimization::Basic,
            phase_saving: PhaseSaving::Full,
            rnd_pol: false,
            rnd_init_act: false,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            min_learnts_lim: 0,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,
            remove_satisfied: true,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 <= self.random_var_freq && self.random_var_freq <= 1.0)
            && (0.0 < self.random_seed && self.random_seed < f64::INFINITY)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && 0 <= self.min_learnts_lim
            && (0.0 < self.learntsize_factor && self.learntsize_factor < f64::INFINITY)
            && (1.0 <= self.learntsize_inc && self.learntsize_inc < f64::INFINITY)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::callbacks::Basic;
    use crate::channel::FactKind;
    use std::{cell::RefCell, rc::Rc};

    type S = Solver<Basic>;

    fn lit(s: &mut S, i: i32) -> Lit {
        let v = s.var_of_int(i.abs() as u32 - 1);
        Lit::new(v, i > 0)
    }

    fn add(s: &mut S, c: &[i32]) -> bool {
        let c: Vec<Lit> = c.iter().map(|&i| lit(s, i)).collect();
        s.add_clause(&c)
    }

    /// `n` pigeons in `n-1` holes, unsat.
    fn pigeons(s: &mut S, n: i32) {
        let holes = n - 1;
        let p = |i: i32, j: i32| i * holes + j + 1;
        for i in 0..n {
            let c: Vec<i32> = (0..holes).map(|j| p(i, j)).collect();
            add(s, &c);
        }
        for j in 0..holes {
            for i1 in 0..n {
                for i2 in i1 + 1..n {
                    add(s, &[-p(i1, j), -p(i2, j)]);
                }
            }
        }
    }

    /// Drive the search by hand, the way a CP layer would. Stops after
    /// `max_conflicts` conflicts, at a propagated state above the root, or when
    /// nothing is left to decide.
    fn drive(s: &mut S, max_conflicts: u64, mut on_learnt: impl FnMut(&S)) {
        let start = s.num_conflicts();
        loop {
            if !s.propagate() {
                if !s.resolve_conflict() {
                    return;
                }
                on_learnt(s);
                continue;
            }
            if s.num_conflicts() - start >= max_conflicts && s.decision_level() > 0 {
                return;
            }
            let next = s.v.pick_branch_lit();
            if next == Lit::UNDEF {
                return;
            }
            s.decide(next);
        }
    }

    fn trail_snapshot(s: &S) -> (Vec<Lit>, Vec<u32>, usize, Vec<lbool>, usize) {
        let ass = (0..s.num_vars())
            .map(|i| s.value_var(Var::from_idx(i)))
            .collect();
        (
            s.v.vars.trail.clone(),
            s.v.vars.trail_lim.clone(),
            s.v.qhead,
            ass,
            s.v.order_heap_data.len(),
        )
    }

    #[test]
    fn test_luby() {
        let seq: Vec<f64> = (0..15).map(|i| utils::luby(2.0, i)).collect();
        assert_eq!(
            seq,
            vec![1., 1., 2., 1., 1., 2., 4., 1., 1., 2., 1., 1., 2., 4., 8.]
        );
    }

    #[test]
    fn test_unit_propagation_closure() {
        let mut s = S::default();
        add(&mut s, &[1, 2]);
        add(&mut s, &[-1, 3]);
        add(&mut s, &[-3, -2, 4]);
        let a = lit(&mut s, 1);
        s.decide(a);
        let (b, c, d) = (lit(&mut s, 2), lit(&mut s, 3), lit(&mut s, 4));
        assert!(s.propagate());
        assert_eq!(s.value_lit(c), lbool::TRUE);
        assert_eq!(s.value_lit(b), lbool::UNDEF);
        s.decide(!b);
        assert!(s.propagate());
        // nothing else follows: (1 2) is satisfied, (-3 -2 4) too
        assert_eq!(s.value_lit(d), lbool::UNDEF);
        assert_eq!(s.decision_level(), 2);
        assert_eq!(s.v.qhead, s.v.vars.trail.len());
    }

    #[test]
    fn test_contradiction_is_permanent() {
        let mut s = S::default();
        assert!(add(&mut s, &[1]));
        assert!(!add(&mut s, &[-1]));
        assert!(!s.is_ok());
        let trail = s.v.vars.trail.clone();
        assert_eq!(s.solve_limited(), lbool::FALSE);
        assert!(!add(&mut s, &[2, 3]));
        assert_eq!(s.solve_limited(), lbool::FALSE);
        assert_eq!(s.v.vars.trail, trail);
    }

    #[test]
    fn test_empty_clause() {
        let mut s = S::default();
        assert!(!s.add_clause(&[]));
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }

    #[test]
    fn test_two_clauses_sat() {
        let mut s = S::default();
        add(&mut s, &[1, 2]);
        add(&mut s, &[-1, -2]);
        assert_eq!(s.solve_limited(), lbool::TRUE);
        let (a, b) = (lit(&mut s, 1), lit(&mut s, 2));
        assert_ne!(s.model_value(a), s.model_value(b));
        assert_ne!(s.model_value(a), lbool::UNDEF);
        assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn test_pigeons_unsat() {
        let mut s = S::default();
        pigeons(&mut s, 5);
        assert_eq!(s.solve_limited(), lbool::FALSE);
        assert!(s.num_conflicts() > 0);
        assert!(s.get_model().is_empty());
    }

    #[test]
    fn test_learnt_clause_is_asserting() {
        let mut s = S::default();
        pigeons(&mut s, 5);
        let mut checked = 0;
        drive(&mut s, 200, |s| {
            match s.learnts.last() {
                Some(&cr) if s.decision_level() > 0 => {
                    let c = s.v.ca.get_ref(cr);
                    if s.v.value_lit(c[0]) != lbool::TRUE || !s.v.locked(cr) {
                        return; // older clause, the newest one was a unit
                    }
                    // asserted at the backtrack level, which is the max level of the rest
                    assert_eq!(s.v.level_lit(c[0]), s.decision_level());
                    assert_eq!(s.v.level_lit(c[1]), s.decision_level());
                    for &q in &c.lits()[1..] {
                        assert_eq!(s.v.value_lit(q), lbool::FALSE);
                    }
                    checked += 1;
                }
                _ => {
                    let last = *s.v.vars.trail.last().expect("asserted lit");
                    assert_eq!(s.v.level_lit(last), 0);
                }
            }
        });
        assert!(checked > 0);
    }

    #[test]
    fn test_cancel_until_idempotent() {
        let mut s = S::default();
        add(&mut s, &[-1, 2]);
        add(&mut s, &[-3, 4]);
        add(&mut s, &[-5, 6]);
        for &i in &[1, 3, 5] {
            let p = lit(&mut s, i);
            s.decide(p);
            assert!(s.propagate());
        }
        assert_eq!(s.decision_level(), 3);
        s.cancel_until(1);
        let snap = trail_snapshot(&s);
        s.cancel_until(1);
        assert_eq!(trail_snapshot(&s), snap);
        s.cancel_until(5);
        assert_eq!(trail_snapshot(&s), snap);
        let (b, d) = (lit(&mut s, 2), lit(&mut s, 4));
        assert_eq!(s.value_lit(b), lbool::TRUE);
        assert_eq!(s.value_lit(d), lbool::UNDEF);
    }

    #[test]
    fn test_phase_saving() {
        let mut s = S::default();
        add(&mut s, &[1, 2]);
        let a = lit(&mut s, 1);
        s.decide(a);
        assert!(s.propagate());
        s.cancel_until(0);
        assert!(s.v.polarity[a.var()]);

        let mut opts = SolverOpts::default();
        opts.phase_saving = PhaseSaving::None;
        let mut s = S::new(opts, Basic::new());
        let a = lit(&mut s, 1);
        s.decide(a);
        s.cancel_until(0);
        assert!(!s.v.polarity[a.var()]);
    }

    #[test]
    fn test_reduce_db_keeps_reasons() {
        let mut s = S::default();
        pigeons(&mut s, 7);
        drive(&mut s, 150, |_| ());
        assert!(s.is_ok());
        assert!(s.decision_level() > 0);
        let n_learnts = s.learnts.len();
        assert!(n_learnts > 10);
        s.reduce_db();
        assert!(s.learnts.len() < n_learnts);
        assert!(s.v.reasons_are_live());
        for &lit in &s.v.vars.trail {
            if let Reason::Clause(cr) = s.v.reason(lit.var()) {
                assert!(s.learnts.contains(&cr) || s.clauses.contains(&cr));
                assert_eq!(s.v.ca.get_ref(cr)[0], lit);
            }
        }
        // search can go on from there
        s.cancel_until(0);
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }

    #[test]
    fn test_restart_schedule_does_not_change_verdict() {
        for &(luby, first) in &[(true, 1), (true, 100), (false, 1), (false, 50)] {
            let mut opts = SolverOpts::default();
            opts.luby_restart = luby;
            opts.restart_first = first;
            let mut s = S::new(opts.clone(), Basic::new());
            pigeons(&mut s, 5);
            assert_eq!(s.solve_limited(), lbool::FALSE);

            let mut s = S::new(opts, Basic::new());
            for i in 1..20 {
                add(&mut s, &[-i, i + 1]);
            }
            add(&mut s, &[1, 5]);
            add(&mut s, &[-20, -3, 7]);
            assert_eq!(s.solve_limited(), lbool::TRUE);
        }
    }

    #[test]
    fn test_random_decisions() {
        let mut opts = SolverOpts::default();
        opts.random_var_freq = 1.0;
        let mut s = S::new(opts.clone(), Basic::new());
        pigeons(&mut s, 5);
        assert_eq!(s.solve_limited(), lbool::FALSE);
        assert!(s.v.rnd_decisions > 0);

        let mut s = S::new(opts, Basic::new());
        let clauses: [&[i32]; 6] = [
            &[1, 2, -3],
            &[-1, 3, 4],
            &[-2, -4, 5],
            &[3, -5, 6],
            &[-6, 1, 2],
            &[-1, -2],
        ];
        for c in clauses.iter() {
            add(&mut s, c);
        }
        assert_eq!(s.solve_limited(), lbool::TRUE);
        assert!(s.v.rnd_decisions > 0);
        for c in clauses.iter() {
            assert!(c.iter().any(|&i| {
                let l = lit(&mut s, i);
                s.model_value(l) == lbool::TRUE
            }));
        }
    }

    #[test]
    fn test_gc_under_pressure() {
        let mut opts = SolverOpts::default();
        opts.garbage_frac = 0.01;
        opts.learntsize_factor = 0.01;
        opts.restart_first = 5;
        let mut s = S::new(opts, Basic::new());
        pigeons(&mut s, 6);
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }

    /// Builds a conflict whose first UIP (`u`) is unreliable, with another
    /// unreliable literal (`w`) from an earlier level.
    fn unreliable_setup(unreliable: bool) -> (S, [Lit; 6]) {
        let mut s = S::default();
        let mut vars = vec![];
        for _ in 0..6 {
            vars.push(Lit::new(s.new_var_default(), true));
        }
        let [e, w, a, u, x, y] = [vars[0], vars[1], vars[2], vars[3], vars[4], vars[5]];
        s.set_reliable(w.var(), !unreliable);
        s.set_reliable(u.var(), !unreliable);
        s.add_clause(&[!e, w]);
        s.add_clause(&[!a, u]);
        s.add_clause(&[!u, !w, x]);
        s.add_clause(&[!u, !w, y]);
        s.add_clause(&[!x, !y]);
        s.decide(e);
        assert!(s.propagate());
        assert_eq!(s.value_lit(w), lbool::TRUE);
        s.decide(a);
        assert!(!s.propagate());
        (s, [e, w, a, u, x, y])
    }

    #[test]
    fn test_reliable_uip() {
        let (mut s, [_e, w, _a, u, _x, _y]) = unreliable_setup(false);
        assert!(s.resolve_conflict());
        let cr = *s.learnts.last().expect("learnt clause");
        let mut lits = s.v.ca.get_ref(cr).lits().to_vec();
        lits.sort();
        let mut expect = vec![!u, !w];
        expect.sort();
        assert_eq!(lits, expect);
        assert_eq!(s.decision_level(), 1);
        assert_eq!(s.value_lit(u), lbool::FALSE);
    }

    #[test]
    fn test_unreliable_lits_never_learnt() {
        let (mut s, [e, w, a, u, _x, _y]) = unreliable_setup(true);
        assert!(s.resolve_conflict());
        let cr = *s.learnts.last().expect("learnt clause");
        let mut lits = s.v.ca.get_ref(cr).lits().to_vec();
        assert!(lits.iter().all(|l| l.var() != u.var() && l.var() != w.var()));
        lits.sort();
        let mut expect = vec![!a, !e];
        expect.sort();
        assert_eq!(lits, expect);
        assert_eq!(s.decision_level(), 1);
        assert_eq!(s.value_lit(a), lbool::FALSE);
        assert_eq!(s.v.replaced_literals, 1);
        assert!(s.v.seen.is_clear());
        assert!(s.propagate());
    }

    #[test]
    fn test_unreliable_uip_below_conflict_level() {
        let mut s = S::default();
        let a = Lit::new(s.new_var_default(), true);
        let b = Lit::new(s.new_var_default(), true);
        let u = Lit::new(s.new_var_default(), true);
        let x = Lit::new(s.new_var_default(), true);
        s.set_reliable(u.var(), false);
        s.add_clause(&[!a, u]);
        s.add_clause(&[!u, x]);
        s.add_clause(&[!u, !x]);
        // `b` opens level 2 before `a` is propagated
        s.decide(a);
        s.decide(b);
        assert!(!s.propagate());
        assert_eq!(s.v.level(u.var()), 2);
        assert!(s.resolve_conflict());
        assert_eq!(s.decision_level(), 0);
        assert_eq!(s.value_lit(a), lbool::FALSE);
        assert!(s.v.seen.is_clear());
        assert!(s.propagate());
        assert_eq!(s.solve_limited(), lbool::TRUE);
    }

    #[test]
    fn test_conflict_from_root_facts_only() {
        let mut s = S::default();
        let a = Lit::new(s.new_var_default(), true);
        let b = Lit::new(s.new_var_default(), true);
        let u = Lit::new(s.new_var_default(), true);
        let x = Lit::new(s.new_var_default(), true);
        s.set_reliable(u.var(), false);
        s.add_clause(&[!a, u]);
        s.add_clause(&[!u, x]);
        s.add_clause(&[!u, !x]);
        // `a` is a root fact left in the queue
        s.v.vars.unchecked_enqueue(a, Reason::Undef);
        s.decide(b);
        assert!(!s.propagate());
        assert!(!s.resolve_conflict());
        assert!(!s.is_ok());
        assert_eq!(s.decision_level(), 0);
        assert!(s.v.seen.is_clear());
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }

    #[test]
    fn test_learnt_reason_is_bumped() {
        let mut s = S::default();
        let a = Lit::new(s.new_var_default(), true);
        let b = Lit::new(s.new_var_default(), true);
        let c = Lit::new(s.new_var_default(), true);
        let d = Lit::new(s.new_var_default(), true);
        let cr = s.v.ca.alloc_with_learnt(&[c, !a, !b], true);
        s.learnts.push(cr);
        s.v.attach_clause(cr);
        s.add_clause(&[!c, d]);
        s.add_clause(&[!b, !d]);
        s.decide(a);
        assert!(s.propagate());
        s.decide(b);
        assert!(!s.propagate());
        assert_eq!(s.v.reason(c.var()), Reason::Clause(cr));
        let before = s.v.ca.get_ref(cr).activity();
        assert!(s.resolve_conflict());
        assert!(s.v.ca.get_ref(cr).activity() > before);
        assert_eq!(s.value_lit(b), lbool::FALSE);
    }

    #[test]
    fn test_problem_clauses_justify_inline() {
        let mut s = S::default();
        let a = Lit::new(s.new_var_default(), true);
        let b = Lit::new(s.new_var_default(), true);
        let c = Lit::new(s.new_var_default(), true);
        s.add_clause(&[!a, !b, c]);
        s.decide(a);
        assert!(s.propagate());
        s.decide(b);
        assert!(s.propagate());
        match s.v.reason(c.var()) {
            Reason::Lits(x, y) => {
                let mut r = vec![x, y];
                r.sort();
                let mut expect = vec![!a, !b];
                expect.sort();
                assert_eq!(r, expect);
            }
            r => panic!("unexpected reason {:?}", r),
        }
    }

    #[test]
    fn test_unreliable_decision_stays() {
        let mut s = S::default();
        let d = Lit::new(s.new_var_default(), true);
        let e = Lit::new(s.new_var_default(), true);
        let x = Lit::new(s.new_var_default(), true);
        s.set_reliable(d.var(), false);
        s.add_clause(&[!d, !e, x]);
        s.add_clause(&[!d, !e, !x]);
        s.decide(d);
        assert!(s.propagate());
        s.decide(e);
        assert!(!s.propagate());
        assert!(s.resolve_conflict());
        // `d` has no reason to be replaced with
        assert_eq!(s.value_lit(e), lbool::FALSE);
        assert_eq!(s.decision_level(), 1);
    }

    #[test]
    fn test_channel_sees_every_assignment() {
        let log = Rc::new(RefCell::new(vec![]));
        let mut s = S::default();
        let mut lits = vec![];
        for k in 0..4 {
            let log = log.clone();
            let spec = VarSpec::default()
                .with_info(ChannelInfo::fact(7, FactKind::Le(k), true))
                .with_channel(move |v: Var, b: bool| log.borrow_mut().push((v, b)));
            lits.push(Lit::new(s.new_var_with(spec), true));
        }
        // x <= k implies x <= k+1
        for k in 0..3 {
            s.add_clause(&[!lits[k], lits[k + 1]]);
        }
        s.decide(lits[1]);
        assert!(s.propagate());
        assert_eq!(
            *log.borrow(),
            vec![(lits[1].var(), true), (lits[2].var(), true), (lits[3].var(), true)]
        );
        assert_eq!(s.channel_info(lits[2].var()).kind, FactKind::Le(2));

        s.cancel_until(0);
        log.borrow_mut().clear();
        assert_eq!(s.solve_limited(), lbool::TRUE);
        // the last notification of each var agrees with the model
        for &l in &lits {
            let last = log
                .borrow()
                .iter()
                .rev()
                .find(|&&(v, _)| v == l.var())
                .map(|&(_, b)| b);
            assert_eq!(last.map(lbool::new), Some(s.model_value(l)));
        }
    }

    #[test]
    fn test_add_clause_backjumps() {
        let mut s = S::default();
        let a = lit(&mut s, 1);
        let b = lit(&mut s, 2);
        let c = lit(&mut s, 3);
        s.decide(a);
        assert!(s.propagate());
        s.decide(b);
        assert!(s.propagate());
        s.decide(c);
        assert!(s.propagate());
        // falsified, `!b` alone at its level: it becomes unit at level 1
        assert!(s.add_clause(&[!a, !b]));
        assert_eq!(s.decision_level(), 1);
        assert_eq!(s.value_lit(b), lbool::FALSE);
        assert_eq!(s.v.level_lit(b), 1);
        assert!(s.propagate());

        // unit clauses go to the root
        assert!(s.add_clause(&[c]));
        assert_eq!(s.decision_level(), 0);
        assert_eq!(s.value_lvl_0(c), lbool::TRUE);
        assert!(s.proved_at_lvl_0().contains(&c));
    }

    #[test]
    fn test_add_clause_falsified_at_one_level() {
        let mut s = S::default();
        add(&mut s, &[-1, 2]);
        add(&mut s, &[-1, 3]);
        let a = lit(&mut s, 1);
        s.decide(a);
        assert!(s.propagate());
        // both literals false at level 1: back to level 0, nothing assigned
        assert!(add(&mut s, &[-2, -3]));
        assert_eq!(s.decision_level(), 0);
        assert_eq!(s.value_lit(a), lbool::UNDEF);
        s.decide(a);
        assert!(!s.propagate());
        assert!(s.resolve_conflict());
        assert_eq!(s.value_lvl_0(a), lbool::FALSE);
        assert_eq!(s.solve_limited(), lbool::TRUE);
    }

    #[test]
    fn test_add_clause_unit_under_assignment() {
        let mut s = S::default();
        let a = lit(&mut s, 1);
        let b = lit(&mut s, 2);
        s.decide(a);
        s.decide(b);
        assert!(s.propagate());
        let c = lit(&mut s, 3);
        assert!(s.add_clause(&[!a, c]));
        assert_eq!(s.decision_level(), 1);
        assert_eq!(s.value_lit(c), lbool::TRUE);
        assert_eq!(s.v.level_lit(c), 1);
        // satisfied clause: nothing moves
        let d = lit(&mut s, 4);
        s.decide(b);
        assert!(s.add_clause(&[a, b, d]));
        assert_eq!(s.decision_level(), 2);
    }

    #[test]
    fn test_budget_and_interrupt() {
        let mut s = S::default();
        pigeons(&mut s, 8);
        s.set_budget(Budget::conflicts(10));
        assert_eq!(s.solve_limited(), lbool::UNDEF);
        assert_eq!(s.decision_level(), 0);
        assert!(s.is_ok());
        let c1 = s.num_conflicts();
        assert!(c1 >= 10);
        // budgets count from the start of each call
        assert_eq!(s.solve_limited(), lbool::UNDEF);
        assert!(s.num_conflicts() >= c1 + 10);

        s.set_budget(Budget::propagations(50));
        assert_eq!(s.solve_limited(), lbool::UNDEF);

        s.set_budget(Budget::unlimited());
        s.interrupt_async();
        assert_eq!(s.solve_limited(), lbool::UNDEF);
        assert!(!s.interrupt_handle().load(Ordering::SeqCst));

        s.cb_mut().set_stop(|| true);
        assert_eq!(s.solve_limited(), lbool::UNDEF);
        assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn test_simplify_removes_satisfied() {
        let mut s = S::default();
        add(&mut s, &[1, 2, 3]);
        add(&mut s, &[-1, 2, 3, 4]);
        add(&mut s, &[4, 5]);
        assert_eq!(s.num_clauses(), 3);
        add(&mut s, &[1]);
        assert!(s.simplify());
        assert_eq!(s.num_clauses(), 2);
        // the root-false literal was trimmed
        add(&mut s, &[-4]);
        s.v.simp_db_props = 0; // skip the propagation gate
        assert!(s.simplify());
        let e = lit(&mut s, 5);
        assert_eq!(s.value_lvl_0(e), lbool::TRUE);
        assert_eq!(s.num_clauses(), 1);
        let cr = s.clauses[0];
        assert_eq!(s.v.ca.get_ref(cr).size(), 2);
        assert_eq!(s.v.clauses_literals, 2);
        assert_eq!(s.solve_limited(), lbool::TRUE);
    }

    #[test]
    fn test_non_decision_and_user_polarity() {
        let mut s = S::default();
        let a = s.new_var(lbool::FALSE, true);
        let b = s.new_var(lbool::UNDEF, false);
        assert_eq!(s.solve_limited(), lbool::TRUE);
        assert_eq!(s.model_value(Lit::new(a, true)), lbool::FALSE);
        assert_eq!(s.get_model()[b.idx() as usize], lbool::UNDEF);
    }

    #[test]
    fn test_dimacs_model() {
        let mut s = S::default();
        add(&mut s, &[1]);
        add(&mut s, &[-2]);
        assert_eq!(s.solve_limited(), lbool::TRUE);
        assert_eq!(format!("{}", s.dimacs_model()), "v 1 -2 0\n");
    }

    #[test]
    fn test_opts_check() {
        assert!(SolverOpts::default().check());
        let mut opts = SolverOpts::default();
        opts.restart_inc = 1.0;
        assert!(!opts.check());
        assert_eq!(Minimization::from_level(1), Some(Minimization::Basic));
        assert_eq!(PhaseSaving::from_level(3), None);
    }
}
