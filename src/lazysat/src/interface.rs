/* Main Interface */

use crate::clause::{lbool, Lit, Var};

/// Main interface for a solver: it makes it possible to add clauses,
/// allocate variables, and check for satisfiability
pub trait SolverInterface {
    fn num_vars(&self) -> u32;
    fn num_clauses(&self) -> u64;
    fn num_learnts(&self) -> u64;
    fn num_conflicts(&self) -> u64;
    fn num_propagations(&self) -> u64;
    fn num_decisions(&self) -> u64;
    fn num_restarts(&self) -> u64;

    /// `false` once the clause set is known to be unsatisfiable. Permanent.
    fn is_ok(&self) -> bool;

    /// Creates a new SAT variable in the solver. If 'decision' is cleared, variable will not be
    /// used as a decision variable (NOTE! This has effects on the meaning of a SATISFIABLE result).
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var;

    /// Create a new variable with the default polarity
    fn new_var_default(&mut self) -> Var;

    /// Obtain the variable of index `v_idx`, creating variables up to it if needed.
    fn var_of_int(&mut self, v_idx: u32) -> Var;

    /// Add a clause to the solver. Returns `false` if the solver is in
    /// an `UNSAT` state.
    ///
    /// This can be called at any decision level; the solver backtracks as
    /// needed so that the clause is properly watched (and propagated, if
    /// it is unit under the current assignment). The vector is reused as
    /// scratch space.
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool;

    /// Add a clause given as a slice.
    fn add_clause(&mut self, clause: &[Lit]) -> bool {
        let mut c = clause.to_vec();
        self.add_clause_reuse(&mut c)
    }

    /// Simplify the clause database according to the current top-level assigment.
    ///
    /// Must be called at level 0.
    fn simplify(&mut self) -> bool;

    /// Search for a model, within the current budget.
    ///
    /// Returns `TRUE` (model available), `FALSE` (unsatisfiable, for good)
    /// or `UNDEF` (budget exhausted or interrupted, state at level 0).
    fn solve_limited(&mut self) -> lbool;

    /// Obtain the slice of literals that are proved at level 0.
    ///
    /// These literals will keep this value from now on.
    fn proved_at_lvl_0(&self) -> &[Lit];

    /// Query whole model
    ///
    /// Precondition: last result was `Sat` (ie `lbool::TRUE`)
    fn get_model(&self) -> &[lbool];

    /// Value of `lit` in the last model, `UNDEF` if there is none.
    fn model_value(&self, lit: Lit) -> lbool {
        self.get_model()
            .get(lit.var().idx() as usize)
            .map_or(lbool::UNDEF, |&v| v ^ !lit.sign())
    }

    /// Current value of `v` in the (partial) assignment.
    fn value_var(&self, v: Var) -> lbool;

    /// Current value of `lit` in the (partial) assignment.
    fn value_lit(&self, lit: Lit) -> lbool;

    /// Value of this literal if it's assigned at level 0, or `UNDEF` otherwise
    fn value_lvl_0(&self, lit: Lit) -> lbool;
}
