//! Boundary between the SAT engine and the CP layer that owns its variables.
//!
//! A SAT variable may stand for a fact about a CP domain. The CP layer
//! describes such a variable with a [`ChannelInfo`] and can attach a
//! [`Channel`] that is told, synchronously, about every assignment of it.

use crate::clause::{lbool, Var};
use std::fmt;

/// Observer of the assignments of one variable.
///
/// `notify` is called from inside the engine's enqueue, while the trail is
/// being extended. It must not call back into the solver; it is expected to
/// record the event (e.g. push a domain update on a queue) and return.
pub trait Channel {
    /// `v` has just been assigned `value`, either by a decision or by propagation.
    fn notify(&mut self, v: Var, value: bool);
}

/// Any closure can observe a variable.
impl<F> Channel for F
where
    F: FnMut(Var, bool),
{
    fn notify(&mut self, v: Var, value: bool) {
        self(v, value)
    }
}

/// What boolean fact a variable stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    /// A plain boolean, not tied to any CP domain
    Plain,
    /// `x = k`
    Eq(i64),
    /// `x <= k`
    Le(i64),
}

impl Default for FactKind {
    fn default() -> Self {
        FactKind::Plain
    }
}

/// Static description of a variable, as seen by the CP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Identifier of the CP variable whose domain this literal talks about.
    pub observer: Option<u32>,
    pub kind: FactKind,
    /// If `false`, the variable is a lazily materialized stand-in and must
    /// never occur verbatim in a learnt clause.
    pub reliable: bool,
}

impl Default for ChannelInfo {
    fn default() -> Self {
        ChannelInfo {
            observer: None,
            kind: FactKind::Plain,
            reliable: true,
        }
    }
}

impl ChannelInfo {
    /// Info for a fact about CP variable `observer`.
    pub fn fact(observer: u32, kind: FactKind, reliable: bool) -> Self {
        ChannelInfo {
            observer: Some(observer),
            kind,
            reliable,
        }
    }
}

/// Everything needed to create a variable.
///
/// ```
/// use lazysat::*;
/// let spec = VarSpec::default()
///     .with_info(ChannelInfo::fact(3, FactKind::Le(10), false))
///     .with_polarity(lbool::FALSE);
/// assert!(spec.decision);
/// assert!(!spec.info.reliable);
/// ```
pub struct VarSpec {
    /// Preferred polarity, `UNDEF` to let phase saving decide
    pub polarity: lbool,
    /// May the heuristic branch on this variable?
    pub decision: bool,
    pub info: ChannelInfo,
    pub channel: Option<Box<dyn Channel>>,
}

impl Default for VarSpec {
    fn default() -> Self {
        VarSpec {
            polarity: lbool::UNDEF,
            decision: true,
            info: ChannelInfo::default(),
            channel: None,
        }
    }
}

impl fmt::Debug for VarSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VarSpec")
            .field("polarity", &self.polarity)
            .field("decision", &self.decision)
            .field("info", &self.info)
            .field("channel", &self.channel.is_some())
            .finish()
    }
}

impl VarSpec {
    pub fn with_polarity(mut self, polarity: lbool) -> Self {
        self.polarity = polarity;
        self
    }
    pub fn with_decision(mut self, decision: bool) -> Self {
        self.decision = decision;
        self
    }
    pub fn with_info(mut self, info: ChannelInfo) -> Self {
        self.info = info;
        self
    }
    pub fn with_channel<C: Channel + 'static>(mut self, channel: C) -> Self {
        self.channel = Some(Box::new(channel));
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn test_default_is_plain_reliable() {
        let info = ChannelInfo::default();
        assert_eq!(info.kind, FactKind::Plain);
        assert_eq!(info.observer, None);
        assert!(info.reliable);
        let spec = VarSpec::default();
        assert!(spec.decision && spec.channel.is_none());
        assert_eq!(spec.polarity, lbool::UNDEF);
    }

    #[test]
    fn test_closure_channel() {
        let log = Rc::new(RefCell::new(vec![]));
        let log2 = log.clone();
        let spec = VarSpec::default().with_channel(move |v: Var, b: bool| {
            log2.borrow_mut().push((v.idx(), b));
        });
        let mut ch = spec.channel.expect("channel was set");
        ch.notify(Var::from_idx(2), true);
        ch.notify(Var::from_idx(0), false);
        assert_eq!(*log.borrow(), vec![(2, true), (0, false)]);
    }
}
