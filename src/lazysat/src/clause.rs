/***************************************************************************************[clause.rs]
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
    crate::{
        alloc::{self, RegionAllocator},
        intmap::{AsIndex, IntMap},
    },
    std::{fmt, iter::DoubleEndedIterator, ops, slice, u32},
};

/// A boolean variable, identified by a dense index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}", self.0 + 1)
        }
    }
}

impl Var {
    pub const UNDEF: Var = Var(!0);
    #[inline(always)]
    pub(crate) fn from_idx(idx: u32) -> Self {
        debug_assert!(idx < u32::MAX / 2, "Var::from_idx: index too large");
        Var(idx)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
}

impl AsIndex for Var {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Var(index as u32)
    }
}

pub type VMap<V> = IntMap<Var, V>;

/// A literal, packed as `2 * var + sign`.
///
/// `sign == true` is the positive literal. Negation flips the lowest bit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit(u32);

impl Lit {
    pub const UNDEF: Lit = Lit(!1);

    /// ```
    /// use lazysat::*;
    /// let mut sat = BasicSolver::default();
    /// let v = sat.new_var_default();
    /// let l = Lit::new(v, true);
    /// assert_eq!(l.var(), v);
    /// assert!(l.sign());
    /// assert_eq!(l.idx(), 2 * v.idx() + 1);
    /// assert_eq!(!!l, l);
    /// ```
    #[inline(always)]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit(var.0 * 2 + sign as u32)
    }

    /// Build a literal from a possibly negative variable index.
    ///
    /// Negative indices are folded onto `!v` (that is, `-v - 1`) with the
    /// sign flipped, so `from_signed(-1, true) == !from_signed(0, true)`.
    ///
    /// ```
    /// use lazysat::*;
    /// let mut sat = BasicSolver::default();
    /// let v = sat.new_var_default();
    /// assert_eq!(Lit::from_signed(0, true), Lit::new(v, true));
    /// assert_eq!(Lit::from_signed(-1, true), Lit::new(v, false));
    /// assert_eq!(Lit::from_signed(-1, false), Lit::new(v, true));
    /// ```
    pub fn from_signed(v: i32, sign: bool) -> Self {
        if v >= 0 {
            Lit::new(Var::from_idx(v as u32), sign)
        } else {
            Lit::new(Var::from_idx(!v as u32), !sign)
        }
    }

    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
    #[inline(always)]
    pub fn sign(&self) -> bool {
        (self.0 & 1) == 1
    }
    #[inline(always)]
    pub fn var(&self) -> Var {
        Var(self.0 >> 1)
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !1 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}{:?}", if self.sign() { "" } else { "-" }, self.var())
        }
    }
}

impl ops::Not for Lit {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}

impl AsIndex for Lit {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Lit(index as u32)
    }
}

pub type LMap<V> = IntMap<Lit, V>;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
/// A ternary boolean (true, false, undefined) used for partial assignments.
pub struct lbool(u8);

impl fmt::Debug for lbool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "TRUE")
        } else if self.0 == 1 {
            write!(f, "FALSE")
        } else if self.0 <= 3 {
            write!(f, "UNDEF")
        } else {
            // unreachable
            write!(f, "lbool({})", self.0)
        }
    }
}
impl Default for lbool {
    fn default() -> Self {
        lbool::UNDEF
    }
}

impl lbool {
    pub const TRUE: lbool = lbool(0);
    pub const FALSE: lbool = lbool(1);
    pub const UNDEF: lbool = lbool(2);
    pub fn from_u8(v: u8) -> Self {
        debug_assert!(v == (v & 3), "lbool::from_u8: invalid value");
        lbool(v)
    }
    #[inline(always)]
    pub fn new(v: bool) -> Self {
        lbool((!v) as u8)
    }
}

// any two undefined values are equal, whatever their bit pattern
impl PartialEq for lbool {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0 || (self.0 & rhs.0 & 2) != 0
    }
}

impl Eq for lbool {}

impl ops::Neg for lbool {
    type Output = lbool;

    /// Negation of a `lbool`
    fn neg(self) -> Self {
        lbool(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for lbool {
    type Output = lbool;

    /// Xor of a lbool with a boolean.
    #[inline(always)]
    fn bitxor(self, rhs: bool) -> Self {
        lbool(self.0 ^ rhs as u8)
    }
}

impl From<bool> for lbool {
    fn from(x: bool) -> Self {
        lbool::new(x)
    }
}

/// Metadata of a clause, packed in one word.
///
/// Layout:
/// unsigned mark      : 2;
/// unsigned learnt    : 1;
/// unsigned has_extra : 1;
/// unsigned reloced   : 1;
/// unsigned size      : 27;
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ClauseHeader(u32);

impl fmt::Debug for ClauseHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClauseHeader")
            .field("mark", &self.mark())
            .field("learnt", &self.learnt())
            .field("has_extra", &self.has_extra())
            .field("reloced", &self.reloced())
            .field("size", &self.size())
            .finish()
    }
}

impl ClauseHeader {
    pub const MAX_SIZE: u32 = (1 << 27) - 1;

    pub fn new(mark: u32, learnt: bool, has_extra: bool, reloced: bool, size: u32) -> Self {
        debug_assert!(mark < 4);
        debug_assert!(size <= Self::MAX_SIZE);
        ClauseHeader(
            (mark << 30)
                | ((learnt as u32) << 29)
                | ((has_extra as u32) << 28)
                | ((reloced as u32) << 27)
                | size,
        )
    }
    #[inline(always)]
    pub fn mark(&self) -> u32 {
        self.0 >> 30
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        (self.0 & (1 << 29)) != 0
    }
    #[inline(always)]
    pub fn has_extra(&self) -> bool {
        (self.0 & (1 << 28)) != 0
    }
    #[inline(always)]
    pub fn reloced(&self) -> bool {
        (self.0 & (1 << 27)) != 0
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.0 & Self::MAX_SIZE
    }
    pub fn set_mark(&mut self, mark: u32) {
        debug_assert!(mark < 4);
        self.0 = (self.0 & !(3 << 30)) | (mark << 30);
    }
    pub fn set_reloced(&mut self, reloced: bool) {
        self.0 = (self.0 & !(1 << 27)) | ((reloced as u32) << 27);
    }
    pub fn set_size(&mut self, size: u32) {
        debug_assert!(size <= Self::MAX_SIZE);
        self.0 = (self.0 & !Self::MAX_SIZE) | size;
    }
}

#[inline(always)]
fn as_lits(words: &[u32]) -> &[Lit] {
    // `Lit` is a `repr(transparent)` wrapper around `u32`
    unsafe { slice::from_raw_parts(words.as_ptr() as *const Lit, words.len()) }
}

#[inline(always)]
fn as_lits_mut(words: &mut [u32]) -> &mut [Lit] {
    unsafe { slice::from_raw_parts_mut(words.as_mut_ptr() as *mut Lit, words.len()) }
}

#[derive(Debug, Clone, Copy)]
/// A reference to some clause
pub(crate) struct ClauseRef<'a> {
    header: ClauseHeader,
    lits: &'a [Lit],
    extra: Option<u32>,
}

#[derive(Debug)]
/// A mutable reference to some clause, with a temporary lifetime
pub(crate) struct ClauseMut<'a> {
    header: &'a mut u32,
    lits: &'a mut [Lit],
    extra: Option<&'a mut u32>,
}

impl<'a> ClauseRef<'a> {
    #[inline(always)]
    pub fn mark(&self) -> u32 {
        self.header.mark()
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        self.header.learnt()
    }
    #[inline(always)]
    pub fn reloced(&self) -> bool {
        self.header.reloced()
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.header.size()
    }
    #[inline(always)]
    pub fn activity(&self) -> f32 {
        debug_assert!(self.header.has_extra());
        self.extra.map_or(0., f32::from_bits)
    }
    #[inline(always)]
    pub fn lits(&self) -> &'a [Lit] {
        self.lits
    }
    #[inline(always)]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a Lit> {
        self.lits.iter()
    }
}

impl<'a> ClauseMut<'a> {
    #[inline(always)]
    fn header(&self) -> ClauseHeader {
        ClauseHeader(*self.header)
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.lits.len() as u32
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        self.header().learnt()
    }
    #[inline(always)]
    pub fn set_mark(&mut self, mark: u32) {
        let mut h = self.header();
        h.set_mark(mark);
        *self.header = h.0;
    }
    #[inline(always)]
    pub fn activity(&self) -> f32 {
        self.extra.as_ref().map_or(0., |x| f32::from_bits(**x))
    }
    #[inline(always)]
    pub fn set_activity(&mut self, activity: f32) {
        debug_assert!(self.header().has_extra());
        if let Some(x) = self.extra.as_mut() {
            **x = activity.to_bits();
        }
    }
}

impl<'a> ops::Index<u32> for ClauseRef<'a> {
    type Output = Lit;
    #[inline(always)]
    fn index(&self, index: u32) -> &Self::Output {
        &self.lits[index as usize]
    }
}
impl<'a> ops::Index<u32> for ClauseMut<'a> {
    type Output = Lit;
    #[inline(always)]
    fn index(&self, index: u32) -> &Self::Output {
        &self.lits[index as usize]
    }
}
impl<'a> ops::IndexMut<u32> for ClauseMut<'a> {
    #[inline(always)]
    fn index_mut(&mut self, index: u32) -> &mut Self::Output {
        &mut self.lits[index as usize]
    }
}

pub(crate) type CRef = alloc::Ref<u32>;

#[derive(Debug)]
/// Main clause allocator. It stores a set of clauses in a flat arena of words.
///
/// A clause is `[header, lit_0, ..., lit_{n-1}, extra?]`; the extra word
/// holds the activity of learnt clauses (as `f32` bits).
pub struct ClauseAllocator {
    ra: RegionAllocator<u32>,
}

impl ClauseAllocator {
    pub const UNIT_SIZE: u32 = 32;
    pub fn with_start_cap(start_cap: u32) -> Self {
        Self {
            ra: RegionAllocator::new(start_cap),
        }
    }
    pub fn new() -> Self {
        Self::with_start_cap(1024 * 1024)
    }
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.ra.len()
    }
    #[inline(always)]
    pub fn wasted(&self) -> u32 {
        self.ra.wasted()
    }

    pub(crate) fn alloc_with_learnt(&mut self, clause: &[Lit], learnt: bool) -> CRef {
        debug_assert!(clause.len() > 1, "unit clauses are never stored");
        let size = clause.len() as u32;
        let cid = self.ra.alloc(1 + size + learnt as u32);
        self.ra[cid] = ClauseHeader::new(0, learnt, learnt, false, size).0;
        let body = self.ra.subslice_mut(cid + 1, size);
        for (w, &lit) in body.iter_mut().zip(clause) {
            *w = lit.0;
        }
        if learnt {
            self.ra[cid + 1 + size] = 0f32.to_bits();
        }
        cid
    }

    fn alloc_copy(&mut self, from: ClauseRef) -> CRef {
        let size = from.size();
        let cid = self.ra.alloc(1 + size + from.header.has_extra() as u32);
        self.ra[cid] = from.header.0;
        for (w, &lit) in self.ra.subslice_mut(cid + 1, size).iter_mut().zip(from.lits) {
            *w = lit.0;
        }
        if let Some(extra) = from.extra {
            self.ra[cid + 1 + size] = extra;
        }
        cid
    }

    /// Account for the space of `cr`, which must not be used anymore.
    pub(crate) fn free(&mut self, cr: CRef) {
        let size = {
            let c = self.get_ref(cr);
            1 + c.size() + c.header.has_extra() as u32
        };
        self.ra.free(size);
    }

    /// Remove the literals after position `new_size` (keeping the extra word).
    pub(crate) fn shrink(&mut self, cr: CRef, new_size: u32) {
        let header = ClauseHeader(self.ra[cr]);
        let old_size = header.size();
        debug_assert!(2 <= new_size && new_size <= old_size);
        if new_size < old_size {
            let mut h = header;
            h.set_size(new_size);
            self.ra[cr] = h.0;
            if header.has_extra() {
                self.ra[cr + 1 + new_size] = self.ra[cr + 1 + old_size];
            }
            self.ra.free(old_size - new_size);
        }
    }

    /// Relocate clause `cr` into allocator `to`.
    ///
    /// post condition: `*cr` now contains the index of the copy in `to`
    pub(crate) fn reloc(&mut self, cr: &mut CRef, to: &mut ClauseAllocator) {
        let mut header = ClauseHeader(self.ra[*cr]);
        if header.reloced() {
            // forwarding address is stored in place of the first literal
            *cr = CRef::from_raw(self.ra[*cr + 1]);
            return;
        }

        let new_cr = to.alloc_copy(self.get_ref(*cr));
        header.set_reloced(true);
        self.ra[*cr] = header.0;
        self.ra[*cr + 1] = new_cr.to_raw();
        *cr = new_cr;
    }

    /// Get a reference on the clause `cr` points to
    pub(crate) fn get_ref(&self, cr: CRef) -> ClauseRef {
        let header = ClauseHeader(self.ra[cr]);
        let size = header.size();
        let lits = as_lits(self.ra.subslice(cr + 1, size));
        let extra = if header.has_extra() {
            Some(self.ra[cr + 1 + size])
        } else {
            None
        };
        ClauseRef {
            header,
            lits,
            extra,
        }
    }

    /// Get a mutable reference on the clause `cr` points to
    pub(crate) fn get_mut(&mut self, cr: CRef) -> ClauseMut {
        let header = ClauseHeader(self.ra[cr]);
        let size = header.size();
        let len = 1 + size + header.has_extra() as u32;

        let words = self.ra.subslice_mut(cr, len);
        let (w0, rest) = words.split_at_mut(1);
        let (body, extra) = rest.split_at_mut(size as usize);
        ClauseMut {
            header: &mut w0[0],
            lits: as_lits_mut(body),
            extra: extra.first_mut(),
        }
    }
}

/// Anything that can be considered as a list of literals.
pub trait ClauseIterable: fmt::Debug {
    fn items(&self) -> &[Lit];
}

/// Any iterable clause can be printed in DIMACS
impl<T: ClauseIterable> display::Print for T {
    // display as DIMACS
    fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result {
        for &lit in self.items().iter() {
            write!(
                out,
                "{}{} ",
                (if lit.sign() { "" } else { "-" }),
                lit.var().idx() + 1
            )?;
        }
        write!(out, "0")?;
        Ok(())
    }
}

impl<'a> ClauseIterable for ClauseRef<'a> {
    fn items(&self) -> &[Lit] {
        self.lits
    }
}

impl<'a> ClauseIterable for &'a [Lit] {
    fn items(&self) -> &[Lit] {
        self
    }
}

impl ClauseIterable for Vec<Lit> {
    fn items(&self) -> &[Lit] {
        self
    }
}

/// Generic interface for objects printable in DIMACS
pub mod display {
    use std::fmt;

    /// Objects that can be printed in DIMACS syntax
    pub trait Print: Sized {
        fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result;

        /// Any type implementing `T` can  be used in a format string by
        /// just using `x.pp_dimacs()` instead of `x`.
        ///
        /// ```
        /// use lazysat::*;
        /// let mut sat = BasicSolver::default();
        /// let a = Lit::new(sat.new_var_default(), true);
        /// let b = Lit::new(sat.new_var_default(), false);
        /// let v: Vec<Lit> = vec![a, b];
        /// assert_eq!(format!("{}", v.pp_dimacs()), "1 -2 0");
        /// ```
        fn pp_dimacs(&self) -> PrintWrapper<Self> {
            PrintWrapper(self)
        }
    }

    /// A wrapper that can be used to display objects in format strings
    pub struct PrintWrapper<'a, T: 'a + Print>(&'a T);

    // Whenever `T` is printable in DIMACS, its wrapper implements Display
    impl<'a, T: Print> fmt::Display for PrintWrapper<'a, T> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            self.0.fmt_dimacs(out)
        }
    }
}
