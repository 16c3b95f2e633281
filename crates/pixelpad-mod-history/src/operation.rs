/// Reversible units of work: leaf adjustments, groups, and no-ops.
///
/// `Operation` is a closed union. Every variant implements [`Reversible`],
/// and the union dispatches to the variant. Operations hold only a weak
/// handle to the pixel surface they act on.
use std::mem::size_of;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::effect::{EffectKind, EffectStep};
use crate::error::{OperationError, OperationResult};
use crate::summary::OperationSummary;
use crate::surface::{PixelBuffer, Region, SharedSurface, WeakSurface};

/// Bookkeeping cost charged per leaf on top of its snapshots.
const LEAF_OVERHEAD_BYTES: usize = 256;
const GROUP_OVERHEAD_BYTES: usize = 128;
const NOOP_OVERHEAD_BYTES: usize = 64;

pub type OperationId = Uuid;

/// Variant tag, as reported by [`OperationSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Leaf,
    Group,
    NoOp,
}

/// Lifecycle of an operation relative to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    #[default]
    Unapplied,
    Applied,
    Reverted,
}

/// Capabilities every operation variant provides.
pub trait Reversible {
    /// Performs the forward effect. Applying again after a revert must
    /// reproduce the same pixels.
    fn apply(&mut self) -> OperationResult<()>;

    /// Restores the state preceding the most recent apply.
    fn revert(&mut self) -> OperationResult<()>;

    /// Approximate retained memory in bytes.
    fn estimate_footprint(&self) -> usize;

    /// False once the surface this operation is bound to is gone.
    fn is_still_valid(&self) -> bool;

    fn describe(&self) -> OperationSummary;
}

/// Identity and timing shared by all variants.
#[derive(Debug, Clone)]
struct Header {
    id: OperationId,
    label: String,
    created_at: Instant,
    recorded_at: DateTime<Utc>,
    state: OperationState,
}

impl Header {
    fn new(label: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            created_at: Instant::now(),
            recorded_at: Utc::now(),
            state: OperationState::Unapplied,
        }
    }

    fn summary(
        &self,
        kind: OperationKind,
        params: serde_json::Value,
        footprint_bytes: usize,
        children: Vec<OperationSummary>,
    ) -> OperationSummary {
        OperationSummary {
            id: self.id,
            label: self.label.clone(),
            timestamp: self.recorded_at,
            kind,
            state: self.state,
            params,
            footprint_bytes,
            children,
        }
    }
}

// ── Leaf ───────────────────────────────────────────────────────────────

/// A pixel adjustment over one region of the surface.
///
/// The before snapshot is captured on first apply (unless supplied up
/// front), the effect steps run once, and the result is kept as the after
/// snapshot. Redo writes the after snapshot back without recomputing.
#[derive(Debug, Clone)]
pub struct LeafOperation {
    header: Header,
    surface: WeakSurface,
    region: Region,
    category: EffectKind,
    steps: Vec<EffectStep>,
    before: Option<Arc<PixelBuffer>>,
    after: Option<Arc<PixelBuffer>>,
}

impl LeafOperation {
    /// Creates a leaf that will run `step` over `region` of `surface`.
    pub fn new(
        label: impl Into<String>,
        surface: &SharedSurface,
        region: Region,
        step: EffectStep,
    ) -> Self {
        Self {
            header: Header::new(label.into()),
            surface: Rc::downgrade(surface),
            region,
            category: step.kind(),
            steps: vec![step],
            before: None,
            after: None,
        }
    }

    /// Supplies an already captured before snapshot, so apply skips the read.
    pub fn with_before(mut self, snapshot: PixelBuffer) -> Self {
        self.before = Some(Arc::new(snapshot));
        self
    }

    /// Effect category of the first step; merges only happen within one category.
    pub fn category(&self) -> EffectKind {
        self.category
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn steps(&self) -> &[EffectStep] {
        &self.steps
    }

    pub fn before_snapshot(&self) -> Option<&PixelBuffer> {
        self.before.as_deref()
    }

    pub fn after_snapshot(&self) -> Option<&PixelBuffer> {
        self.after.as_deref()
    }

    /// Combines `self` followed by `next` into one leaf.
    ///
    /// Both must be applied, target the same region of the same surface and
    /// share a category. The result starts from `self`'s before snapshot and
    /// ends at `next`'s after snapshot.
    pub fn try_combine(&self, next: &LeafOperation) -> Option<LeafOperation> {
        if self.category != next.category
            || self.region != next.region
            || !self.surface.ptr_eq(&next.surface)
            || self.header.state != OperationState::Applied
            || next.header.state != OperationState::Applied
        {
            return None;
        }
        let before = self.before.clone()?;
        let after = next.after.clone()?;

        let mut steps = self.steps.clone();
        steps.extend_from_slice(&next.steps);

        Some(LeafOperation {
            header: Header {
                id: Uuid::new_v4(),
                label: self.header.label.clone(),
                created_at: next.header.created_at,
                recorded_at: self.header.recorded_at,
                state: OperationState::Applied,
            },
            surface: self.surface.clone(),
            region: self.region,
            category: self.category,
            steps,
            before: Some(before),
            after: Some(after),
        })
    }

    fn render(&self, input: &PixelBuffer) -> OperationResult<PixelBuffer> {
        self.steps.iter().try_fold(input.clone(), |current, step| {
            let effect = step.kind();
            let next = step
                .render(&current)
                .map_err(|source| OperationError::EffectFailed { effect, source })?;
            if next.dimensions() != current.dimensions() {
                return Err(OperationError::EffectFailed {
                    effect,
                    source: anyhow::anyhow!(
                        "effect changed buffer size from {}x{} to {}x{}",
                        current.width(),
                        current.height(),
                        next.width(),
                        next.height()
                    ),
                });
            }
            Ok(next)
        })
    }
}

impl Reversible for LeafOperation {
    fn apply(&mut self) -> OperationResult<()> {
        let surface = self
            .surface
            .upgrade()
            .ok_or(OperationError::SurfaceUnavailable)?;
        let mut surface = surface
            .try_borrow_mut()
            .map_err(|_| OperationError::invalid_state("pixel surface is already in use"))?;
        let (x, y) = (self.region.x, self.region.y);

        if let Some(after) = &self.after {
            surface
                .write_region(after, x, y)
                .map_err(OperationError::Surface)?;
            self.header.state = OperationState::Applied;
            return Ok(());
        }

        let before = match &self.before {
            Some(before) => {
                if before.dimensions() != (self.region.width, self.region.height) {
                    return Err(OperationError::invalid_state(format!(
                        "before snapshot is {}x{} but the region is {}x{}",
                        before.width(),
                        before.height(),
                        self.region.width,
                        self.region.height
                    )));
                }
                Arc::clone(before)
            }
            None => Arc::new(
                surface
                    .read_region(self.region)
                    .map_err(OperationError::Surface)?,
            ),
        };

        let after = self.render(&before)?;
        surface
            .write_region(&after, x, y)
            .map_err(OperationError::Surface)?;

        self.before = Some(before);
        self.after = Some(Arc::new(after));
        self.header.state = OperationState::Applied;
        Ok(())
    }

    fn revert(&mut self) -> OperationResult<()> {
        if self.header.state == OperationState::Unapplied {
            return Err(OperationError::NotYetApplied);
        }
        let before = self.before.as_ref().ok_or(OperationError::NotYetApplied)?;
        let surface = self
            .surface
            .upgrade()
            .ok_or(OperationError::SurfaceUnavailable)?;
        surface
            .try_borrow_mut()
            .map_err(|_| OperationError::invalid_state("pixel surface is already in use"))?
            .write_region(before, self.region.x, self.region.y)
            .map_err(OperationError::Surface)?;
        self.header.state = OperationState::Reverted;
        Ok(())
    }

    fn estimate_footprint(&self) -> usize {
        let snapshots: usize = [&self.before, &self.after]
            .into_iter()
            .flatten()
            .map(|buf| buf.byte_len())
            .sum();
        LEAF_OVERHEAD_BYTES
            + self.header.label.len()
            + self.steps.len() * size_of::<EffectStep>()
            + snapshots
    }

    fn is_still_valid(&self) -> bool {
        self.surface.strong_count() > 0
    }

    fn describe(&self) -> OperationSummary {
        let steps: Vec<_> = self.steps.iter().map(|s| s.adjustment).collect();
        let params = serde_json::json!({
            "region": self.region,
            "steps": steps,
        });
        self.header
            .summary(OperationKind::Leaf, params, self.estimate_footprint(), Vec::new())
    }
}

// ── Group ──────────────────────────────────────────────────────────────

/// An ordered batch of operations that undo and redo as one step.
///
/// Apply runs children front to back, revert back to front. Both stop at
/// the first failing child without rolling back the children already done.
#[derive(Debug, Clone)]
pub struct GroupOperation {
    header: Header,
    children: Vec<Operation>,
    sealed: bool,
}

impl GroupOperation {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            header: Header::new(label.into()),
            children: Vec::new(),
            sealed: false,
        }
    }

    /// Appends a child. A group that already holds an applied child counts
    /// as applied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once the group is sealed.
    pub fn push(&mut self, child: Operation) -> OperationResult<()> {
        if self.sealed {
            return Err(OperationError::invalid_state(format!(
                "group '{}' is sealed",
                self.header.label
            )));
        }
        if child.state() == OperationState::Applied {
            self.header.state = OperationState::Applied;
        }
        self.children.push(child);
        Ok(())
    }

    /// Closes the group to further children.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn children(&self) -> &[Operation] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenates two sealed, applied groups with the same label.
    pub fn try_combine(&self, next: &GroupOperation) -> Option<GroupOperation> {
        if self.header.label != next.header.label
            || !self.sealed
            || !next.sealed
            || self.header.state != OperationState::Applied
            || next.header.state != OperationState::Applied
        {
            return None;
        }
        let mut children = self.children.clone();
        children.extend(next.children.iter().cloned());
        Some(GroupOperation {
            header: Header {
                id: Uuid::new_v4(),
                label: self.header.label.clone(),
                created_at: next.header.created_at,
                recorded_at: self.header.recorded_at,
                state: OperationState::Applied,
            },
            children,
            sealed: true,
        })
    }
}

impl Reversible for GroupOperation {
    fn apply(&mut self) -> OperationResult<()> {
        for child in &mut self.children {
            child.apply()?;
            // Partial progress is visible, so the group becomes revertible.
            self.header.state = OperationState::Applied;
        }
        self.header.state = OperationState::Applied;
        Ok(())
    }

    fn revert(&mut self) -> OperationResult<()> {
        if self.header.state == OperationState::Unapplied {
            return Err(OperationError::NotYetApplied);
        }
        for child in self.children.iter_mut().rev() {
            if child.state() == OperationState::Unapplied {
                continue;
            }
            child.revert()?;
        }
        self.header.state = OperationState::Reverted;
        Ok(())
    }

    fn estimate_footprint(&self) -> usize {
        GROUP_OVERHEAD_BYTES
            + self.header.label.len()
            + self
                .children
                .iter()
                .map(Reversible::estimate_footprint)
                .sum::<usize>()
    }

    fn is_still_valid(&self) -> bool {
        self.children.iter().all(Reversible::is_still_valid)
    }

    fn describe(&self) -> OperationSummary {
        let children = self.children.iter().map(Reversible::describe).collect();
        self.header.summary(
            OperationKind::Group,
            serde_json::Value::Null,
            self.estimate_footprint(),
            children,
        )
    }
}

// ── No-op ──────────────────────────────────────────────────────────────

/// An operation with no pixel effect, e.g. a placeholder history step.
#[derive(Debug, Clone)]
pub struct NoOpOperation {
    header: Header,
}

impl NoOpOperation {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            header: Header::new(label.into()),
        }
    }
}

impl Reversible for NoOpOperation {
    fn apply(&mut self) -> OperationResult<()> {
        self.header.state = OperationState::Applied;
        Ok(())
    }

    fn revert(&mut self) -> OperationResult<()> {
        if self.header.state == OperationState::Unapplied {
            return Err(OperationError::NotYetApplied);
        }
        self.header.state = OperationState::Reverted;
        Ok(())
    }

    fn estimate_footprint(&self) -> usize {
        NOOP_OVERHEAD_BYTES + self.header.label.len()
    }

    fn is_still_valid(&self) -> bool {
        true
    }

    fn describe(&self) -> OperationSummary {
        self.header.summary(
            OperationKind::NoOp,
            serde_json::Value::Null,
            self.estimate_footprint(),
            Vec::new(),
        )
    }
}

// ── Union ──────────────────────────────────────────────────────────────

/// Any operation the history ledger can hold.
#[derive(Debug, Clone)]
pub enum Operation {
    Leaf(LeafOperation),
    Group(GroupOperation),
    NoOp(NoOpOperation),
}

impl From<LeafOperation> for Operation {
    fn from(op: LeafOperation) -> Self {
        Self::Leaf(op)
    }
}

impl From<GroupOperation> for Operation {
    fn from(op: GroupOperation) -> Self {
        Self::Group(op)
    }
}

impl From<NoOpOperation> for Operation {
    fn from(op: NoOpOperation) -> Self {
        Self::NoOp(op)
    }
}

impl Operation {
    /// Shorthand for a [`NoOpOperation`].
    pub fn no_op(label: impl Into<String>) -> Self {
        NoOpOperation::new(label).into()
    }

    fn header(&self) -> &Header {
        match self {
            Self::Leaf(op) => &op.header,
            Self::Group(op) => &op.header,
            Self::NoOp(op) => &op.header,
        }
    }

    fn header_mut(&mut self) -> &mut Header {
        match self {
            Self::Leaf(op) => &mut op.header,
            Self::Group(op) => &mut op.header,
            Self::NoOp(op) => &mut op.header,
        }
    }

    /// Overrides the monotonic creation time used by the merge window.
    pub fn with_created_at(mut self, created_at: Instant) -> Self {
        self.header_mut().created_at = created_at;
        self
    }

    pub fn id(&self) -> OperationId {
        self.header().id
    }

    pub fn label(&self) -> &str {
        &self.header().label
    }

    pub fn created_at(&self) -> Instant {
        self.header().created_at
    }

    pub fn state(&self) -> OperationState {
        self.header().state
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Leaf(_) => OperationKind::Leaf,
            Self::Group(_) => OperationKind::Group,
            Self::NoOp(_) => OperationKind::NoOp,
        }
    }

    /// Returns a new operation standing for `self` then `next`, or `None`
    /// when the pair cannot form a single undo step. Neither input changes.
    pub fn try_combine(&self, next: &Operation) -> Option<Operation> {
        match (self, next) {
            (Self::Leaf(a), Self::Leaf(b)) => a.try_combine(b).map(Self::Leaf),
            (Self::Group(a), Self::Group(b)) => a.try_combine(b).map(Self::Group),
            _ => None,
        }
    }
}

impl Reversible for Operation {
    fn apply(&mut self) -> OperationResult<()> {
        match self {
            Self::Leaf(op) => op.apply(),
            Self::Group(op) => op.apply(),
            Self::NoOp(op) => op.apply(),
        }
    }

    fn revert(&mut self) -> OperationResult<()> {
        match self {
            Self::Leaf(op) => op.revert(),
            Self::Group(op) => op.revert(),
            Self::NoOp(op) => op.revert(),
        }
    }

    fn estimate_footprint(&self) -> usize {
        match self {
            Self::Leaf(op) => op.estimate_footprint(),
            Self::Group(op) => op.estimate_footprint(),
            Self::NoOp(op) => op.estimate_footprint(),
        }
    }

    fn is_still_valid(&self) -> bool {
        match self {
            Self::Leaf(op) => op.is_still_valid(),
            Self::Group(op) => op.is_still_valid(),
            Self::NoOp(op) => op.is_still_valid(),
        }
    }

    fn describe(&self) -> OperationSummary {
        match self {
            Self::Leaf(op) => op.describe(),
            Self::Group(op) => op.describe(),
            Self::NoOp(op) => op.describe(),
        }
    }
}
