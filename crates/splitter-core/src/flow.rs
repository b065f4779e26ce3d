//! # Expense Creation Flow
//!
//! The multi-step expense wizard as an explicit state value plus a pure
//! reducer. Nothing here is global: the caller owns each `FlowState`.
//!
//! ## Step Sequences
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                   ┌─► ScanUpload ─────► GroupSelect ─► ItemSplit ───┐   │
//! │  TypeSelection ───┤                                                 ├─► │
//! │                   └─► ExpenseDetails ─► GroupSelect ─► SplitConfig ─┘   │
//! │                                                                         │
//! │        ─► Review ─► Finalize ─► Success                                 │
//! │                                                                         │
//! │  Next:  guarded by can_proceed(step)                                    │
//! │  Back:  one step; back to TypeSelection starts over                     │
//! │  Review → Finalize: blocking checks, then final splits are computed     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use splitter_core::flow::{reduce, FlowAction, FlowContext, FlowState, FlowStep, FlowType};
//!
//! let ctx = FlowContext::new(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
//! let state = FlowState::new();
//!
//! let state = reduce(state, FlowAction::SelectType { flow: FlowType::Scan }, &ctx).unwrap();
//! assert_eq!(state.current_step(), FlowStep::ScanUpload);
//!
//! // Cannot leave the upload step without a bill
//! assert!(reduce(state.clone(), FlowAction::Next, &ctx).is_err());
//!
//! let state = reduce(state, FlowAction::Back, &ctx).unwrap();
//! assert_eq!(state.flow_type, None);
//! ```

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::{Money, Tolerance, DISCREPANCY_TOLERANCE};
use crate::reconcile::{calculate_final_splits, calculate_manual_splits};
use crate::types::{Bill, FinalSplit, Group, ItemSplit, ManualExpense, SplitMode};
use crate::validation::{
    parse_expense_form, validate_charge_splits, validate_item_splits, validate_manual_split,
    ExpenseForm, ValidationReport,
};

// =============================================================================
// Steps
// =============================================================================

/// Which kind of expense is being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Receipt photo, extracted line items.
    Scan,
    /// Title and amount typed in.
    Manual,
}

const SCAN_STEPS: [FlowStep; 7] = [
    FlowStep::TypeSelection,
    FlowStep::ScanUpload,
    FlowStep::GroupSelect,
    FlowStep::ItemSplit,
    FlowStep::Review,
    FlowStep::Finalize,
    FlowStep::Success,
];

const MANUAL_STEPS: [FlowStep; 7] = [
    FlowStep::TypeSelection,
    FlowStep::ExpenseDetails,
    FlowStep::GroupSelect,
    FlowStep::SplitConfig,
    FlowStep::Review,
    FlowStep::Finalize,
    FlowStep::Success,
];

const NO_TYPE_STEPS: [FlowStep; 1] = [FlowStep::TypeSelection];

impl FlowType {
    /// The ordered steps of this flow.
    pub fn steps(&self) -> &'static [FlowStep] {
        match self {
            FlowType::Scan => &SCAN_STEPS,
            FlowType::Manual => &MANUAL_STEPS,
        }
    }

    /// Name used in resume snapshots.
    pub fn name(&self) -> &'static str {
        match self {
            FlowType::Scan => "scan",
            FlowType::Manual => "manual",
        }
    }

    /// Parses a snapshot flow name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scan" => Some(FlowType::Scan),
            "manual" => Some(FlowType::Manual),
            _ => None,
        }
    }
}

/// One screen of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum FlowStep {
    TypeSelection,
    ScanUpload,
    ExpenseDetails,
    GroupSelect,
    ItemSplit,
    SplitConfig,
    Review,
    Finalize,
    Success,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::TypeSelection => "type selection",
            FlowStep::ScanUpload => "scan upload",
            FlowStep::ExpenseDetails => "expense details",
            FlowStep::GroupSelect => "group select",
            FlowStep::ItemSplit => "item split",
            FlowStep::SplitConfig => "split config",
            FlowStep::Review => "review",
            FlowStep::Finalize => "finalize",
            FlowStep::Success => "success",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Errors & Context
// =============================================================================

/// An action that is not legal in the current state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowError {
    /// The action does not belong to the current step.
    #[error("{action} is not available on the {step} step")]
    WrongStep { action: &'static str, step: FlowStep },

    /// The step's guard failed.
    #[error("Cannot continue from {step}: {reason}")]
    CannotProceed { step: FlowStep, reason: String },

    #[error("Already at the first step")]
    AtStart,

    #[error("The expense has already been created")]
    Completed,

    /// User input was rejected by a validator.
    #[error("Invalid input: {}", .errors.join("; "))]
    Invalid { errors: Vec<String> },

    /// Core error (wraps CoreError).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ValidationReport> for FlowError {
    fn from(report: ValidationReport) -> Self {
        FlowError::Invalid {
            errors: report.messages(),
        }
    }
}

/// Inputs the reducer needs from outside: the date for form checks and the
/// configured discrepancy tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowContext {
    pub today: NaiveDate,
    pub discrepancy_tolerance: Tolerance,
}

impl FlowContext {
    pub fn new(today: NaiveDate) -> Self {
        FlowContext {
            today,
            discrepancy_tolerance: DISCREPANCY_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.discrepancy_tolerance = tolerance;
        self
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Everything a user can do in the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowAction {
    /// Pick scan or manual (TypeSelection). Advances immediately.
    SelectType { flow: FlowType },
    /// Attach the extracted bill (ScanUpload).
    LoadBill { bill: Bill },
    /// Fix a misread unit price (any scan step before Finalize).
    CorrectItemPrice { index: usize, price: Money },
    /// Submit the manual expense form (ExpenseDetails).
    SetExpenseDetails { form: ExpenseForm },
    /// Choose the group (GroupSelect).
    SelectGroup { group: Group },
    /// Add or replace an item assignment (ItemSplit).
    AssignItem { split: ItemSplit },
    /// Remove an item assignment (ItemSplit).
    UnassignItem { index: usize },
    /// Assign or clear the tax split (ItemSplit).
    SetTaxSplit { split: Option<SplitMode> },
    /// Assign or clear the other-charges split (ItemSplit).
    SetOtherChargesSplit { split: Option<SplitMode> },
    /// Split the manual expense (SplitConfig).
    SetManualSplit { split: SplitMode },
    Next,
    Back,
    Reset,
}

impl FlowAction {
    fn name(&self) -> &'static str {
        match self {
            FlowAction::SelectType { .. } => "selectType",
            FlowAction::LoadBill { .. } => "loadBill",
            FlowAction::CorrectItemPrice { .. } => "correctItemPrice",
            FlowAction::SetExpenseDetails { .. } => "setExpenseDetails",
            FlowAction::SelectGroup { .. } => "selectGroup",
            FlowAction::AssignItem { .. } => "assignItem",
            FlowAction::UnassignItem { .. } => "unassignItem",
            FlowAction::SetTaxSplit { .. } => "setTaxSplit",
            FlowAction::SetOtherChargesSplit { .. } => "setOtherChargesSplit",
            FlowAction::SetManualSplit { .. } => "setManualSplit",
            FlowAction::Next => "next",
            FlowAction::Back => "back",
            FlowAction::Reset => "reset",
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// One user's in-progress expense.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    pub flow_type: Option<FlowType>,
    pub step_index: usize,
    pub bill: Option<Bill>,
    pub expense: Option<ManualExpense>,
    pub group: Option<Group>,
    pub item_splits: Vec<ItemSplit>,
    pub tax_split: Option<SplitMode>,
    pub other_charges_split: Option<SplitMode>,
    pub manual_split: Option<SplitMode>,
    /// Set when entering Finalize, cleared when leaving it backwards.
    pub final_splits: Option<Vec<FinalSplit>>,
}

impl FlowState {
    /// A fresh flow on the type-selection step.
    pub fn new() -> Self {
        FlowState::default()
    }

    /// The steps of the selected flow (just TypeSelection before a choice).
    pub fn steps(&self) -> &'static [FlowStep] {
        match self.flow_type {
            Some(flow) => flow.steps(),
            None => &NO_TYPE_STEPS,
        }
    }

    pub fn current_step(&self) -> FlowStep {
        self.steps()
            .get(self.step_index)
            .copied()
            .unwrap_or(FlowStep::TypeSelection)
    }

    /// Snapshot flow name, `None` before a type is chosen.
    pub fn flow_name(&self) -> Option<&'static str> {
        self.flow_type.map(|f| f.name())
    }

    /// The amount being split: the bill total or the manual amount.
    pub fn total(&self) -> Option<Money> {
        match self.flow_type? {
            FlowType::Scan => self.bill.as_ref().map(|b| b.total_cost),
            FlowType::Manual => self.expense.as_ref().map(|e| e.amount),
        }
    }

    /// Description for the created expense.
    pub fn description(&self) -> Option<&str> {
        match self.flow_type? {
            FlowType::Scan => self.bill.as_ref().map(|b| b.store_name.as_str()),
            FlowType::Manual => self.expense.as_ref().map(|e| e.title.as_str()),
        }
    }

    /// Date of the created expense.
    pub fn date(&self) -> Option<NaiveDate> {
        match self.flow_type? {
            FlowType::Scan => self.bill.as_ref().map(|b| b.date),
            FlowType::Manual => self.expense.as_ref().map(|e| e.date),
        }
    }

    /// Guard for leaving the current step forwards.
    pub fn can_proceed(&self) -> Result<(), FlowError> {
        let step = self.current_step();
        let blocked = |reason: &str| FlowError::CannotProceed {
            step,
            reason: reason.to_string(),
        };

        match step {
            FlowStep::TypeSelection if self.flow_type.is_none() => {
                Err(blocked("choose scan or manual entry"))
            }
            FlowStep::ScanUpload if self.bill.is_none() => Err(blocked("no receipt loaded")),
            FlowStep::ExpenseDetails if self.expense.is_none() => {
                Err(blocked("expense details missing"))
            }
            FlowStep::GroupSelect => match &self.group {
                None => Err(blocked("no group selected")),
                Some(g) if g.members.is_empty() => Err(blocked("group has no members")),
                Some(_) => Ok(()),
            },
            FlowStep::ItemSplit if self.item_splits.is_empty() => {
                Err(blocked("assign at least one item"))
            }
            FlowStep::SplitConfig => match &self.manual_split {
                None => Err(blocked("choose how to split the expense")),
                Some(mode) => {
                    let amount = self.total().unwrap_or_default();
                    let report = validate_manual_split(amount, mode);
                    if report.is_valid() {
                        Ok(())
                    } else {
                        Err(blocked(&report.messages().join("; ")))
                    }
                }
            },
            FlowStep::Review => {
                let reasons = self.finalization_blockers();
                if reasons.is_empty() {
                    Ok(())
                } else {
                    Err(FlowError::Core(CoreError::FinalizationBlocked { reasons }))
                }
            }
            FlowStep::Finalize if self.final_splits.is_none() => {
                Err(blocked("final splits not computed"))
            }
            FlowStep::Success => Err(FlowError::Completed),
            _ => Ok(()),
        }
    }

    /// Everything that prevents submitting the expense.
    ///
    /// An unresolved discrepancy blocks here even though it never blocks
    /// editing.
    pub fn finalization_blockers(&self) -> Vec<String> {
        let mut reasons = Vec::new();

        if self.group.is_none() {
            reasons.push("No group selected".to_string());
        }

        match self.flow_type {
            None => reasons.push("No expense type selected".to_string()),
            Some(FlowType::Scan) => match &self.bill {
                None => reasons.push("No receipt loaded".to_string()),
                Some(bill) => {
                    if bill.discrepancy.flag {
                        reasons.push(
                            bill.discrepancy
                                .message
                                .clone()
                                .unwrap_or_else(|| "Receipt total does not match".to_string()),
                        );
                    }
                    let mut report = validate_item_splits(bill, &self.item_splits);
                    report.merge(validate_charge_splits(
                        bill,
                        self.tax_split.as_ref(),
                        self.other_charges_split.as_ref(),
                    ));
                    reasons.extend(report.messages());
                }
            },
            Some(FlowType::Manual) => match (&self.expense, &self.manual_split) {
                (None, _) => reasons.push("Expense details missing".to_string()),
                (Some(_), None) => reasons.push("Expense has no members assigned".to_string()),
                (Some(expense), Some(mode)) => {
                    reasons.extend(validate_manual_split(expense.amount, mode).messages());
                }
            },
        }

        reasons
    }

    /// Runs the blocking checks and reconciles.
    pub fn compute_final_splits(&self) -> Result<Vec<FinalSplit>, FlowError> {
        let reasons = self.finalization_blockers();
        if !reasons.is_empty() {
            return Err(CoreError::FinalizationBlocked { reasons }.into());
        }

        let (Some(flow), Some(group)) = (self.flow_type, &self.group) else {
            return Err(FlowError::CannotProceed {
                step: self.current_step(),
                reason: "flow incomplete".to_string(),
            });
        };
        let members = group.member_order();

        let splits = match (flow, &self.bill, &self.expense, &self.manual_split) {
            (FlowType::Scan, Some(bill), _, _) => calculate_final_splits(
                bill,
                &members,
                &self.item_splits,
                self.tax_split.as_ref(),
                self.other_charges_split.as_ref(),
            )?,
            (FlowType::Manual, _, Some(expense), Some(mode)) => {
                calculate_manual_splits(expense.amount, &members, mode)?
            }
            _ => {
                return Err(FlowError::CannotProceed {
                    step: self.current_step(),
                    reason: "flow incomplete".to_string(),
                })
            }
        };

        Ok(splits)
    }

    fn expect_step(&self, action: &FlowAction, allowed: &[FlowStep]) -> Result<(), FlowError> {
        let step = self.current_step();
        if allowed.contains(&step) {
            Ok(())
        } else {
            Err(FlowError::WrongStep {
                action: action.name(),
                step,
            })
        }
    }

    fn check_members(&self, mode: &SplitMode) -> Result<(), FlowError> {
        let Some(group) = &self.group else {
            return Ok(());
        };
        match mode.member_ids().into_iter().find(|id| !group.contains(id)) {
            Some(id) => Err(CoreError::UnknownMember {
                member_id: id.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    fn clear_splits(&mut self) {
        self.item_splits.clear();
        self.tax_split = None;
        self.other_charges_split = None;
        self.manual_split = None;
        self.final_splits = None;
    }

    fn advance(&mut self) -> Result<(), FlowError> {
        self.can_proceed()?;
        if self.current_step() == FlowStep::Review {
            self.final_splits = Some(self.compute_final_splits()?);
        }
        self.step_index += 1;
        Ok(())
    }

    fn retreat(&mut self) -> Result<(), FlowError> {
        match self.current_step() {
            FlowStep::Success => return Err(FlowError::Completed),
            FlowStep::Finalize => self.final_splits = None,
            _ => {}
        }
        if self.step_index == 0 {
            return Err(FlowError::AtStart);
        }
        self.step_index -= 1;
        if self.step_index == 0 {
            *self = FlowState::new();
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// The cross-device resume record.
    pub fn to_snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            flow_name: self.flow_name().map(str::to_string),
            step_index: self.step_index,
            bill: self.bill.clone(),
        }
    }

    /// Restores a flow from a snapshot.
    ///
    /// The snapshot only carries the bill, so the step index is clamped to
    /// the furthest step whose guard passes with what was restored. A
    /// snapshot never resumes into Finalize or Success.
    pub fn from_snapshot(snapshot: &FlowSnapshot, ctx: &FlowContext) -> FlowState {
        let Some(flow) = snapshot.flow_name.as_deref().and_then(FlowType::from_name) else {
            return FlowState::new();
        };

        let mut bill = snapshot.bill.clone();
        if let Some(b) = bill.as_mut() {
            b.refresh_discrepancy(ctx.discrepancy_tolerance);
        }

        let mut state = FlowState {
            flow_type: Some(flow),
            bill: if flow == FlowType::Scan { bill } else { None },
            ..FlowState::default()
        };

        while state.step_index < snapshot.step_index
            && state.current_step() != FlowStep::Review
            && state.can_proceed().is_ok()
        {
            state.step_index += 1;
        }

        state
    }
}

/// Resume record persisted per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub flow_name: Option<String>,
    pub step_index: usize,
    pub bill: Option<Bill>,
}

// =============================================================================
// Reducer
// =============================================================================

/// Applies one action.
///
/// Pure: the returned state is the only effect. On error the caller keeps
/// the state it passed in.
pub fn reduce(
    mut state: FlowState,
    action: FlowAction,
    ctx: &FlowContext,
) -> Result<FlowState, FlowError> {
    match &action {
        FlowAction::SelectType { flow } => {
            state.expect_step(&action, &[FlowStep::TypeSelection])?;
            state.flow_type = Some(*flow);
            state.advance()?;
        }
        FlowAction::LoadBill { bill } => {
            state.expect_step(&action, &[FlowStep::ScanUpload])?;
            bill.validate_amounts()?;
            let mut bill = bill.clone();
            bill.refresh_discrepancy(ctx.discrepancy_tolerance);
            state.bill = Some(bill);
            state.clear_splits();
        }
        FlowAction::CorrectItemPrice { index, price } => {
            state.expect_step(
                &action,
                &[
                    FlowStep::ScanUpload,
                    FlowStep::GroupSelect,
                    FlowStep::ItemSplit,
                    FlowStep::Review,
                ],
            )?;
            let step = state.current_step();
            let Some(bill) = state.bill.as_mut() else {
                return Err(FlowError::WrongStep {
                    action: action.name(),
                    step,
                });
            };
            bill.correct_item_price(*index, *price, ctx.discrepancy_tolerance)?;
        }
        FlowAction::SetExpenseDetails { form } => {
            state.expect_step(&action, &[FlowStep::ExpenseDetails])?;
            state.expense = Some(parse_expense_form(form, ctx.today)?);
        }
        FlowAction::SelectGroup { group } => {
            state.expect_step(&action, &[FlowStep::GroupSelect])?;
            if state.group.as_ref().map(|g| &g.id) != Some(&group.id) {
                state.clear_splits();
            }
            state.group = Some(group.clone());
        }
        FlowAction::AssignItem { split } => {
            state.expect_step(&action, &[FlowStep::ItemSplit])?;
            let exists = state
                .bill
                .as_ref()
                .is_some_and(|b| b.item(split.item_index).is_some());
            if !exists {
                return Err(CoreError::ItemNotFound {
                    index: split.item_index,
                }
                .into());
            }
            state.check_members(&split.mode)?;
            state.item_splits.retain(|s| s.item_index != split.item_index);
            state.item_splits.push(split.clone());
            state.item_splits.sort_by_key(|s| s.item_index);
        }
        FlowAction::UnassignItem { index } => {
            state.expect_step(&action, &[FlowStep::ItemSplit])?;
            state.item_splits.retain(|s| s.item_index != *index);
        }
        FlowAction::SetTaxSplit { split } => {
            state.expect_step(&action, &[FlowStep::ItemSplit])?;
            if let Some(mode) = split {
                state.check_members(mode)?;
            }
            state.tax_split = split.clone();
        }
        FlowAction::SetOtherChargesSplit { split } => {
            state.expect_step(&action, &[FlowStep::ItemSplit])?;
            if let Some(mode) = split {
                state.check_members(mode)?;
            }
            state.other_charges_split = split.clone();
        }
        FlowAction::SetManualSplit { split } => {
            state.expect_step(&action, &[FlowStep::SplitConfig])?;
            state.check_members(split)?;
            state.manual_split = Some(split.clone());
        }
        FlowAction::Next => state.advance()?,
        FlowAction::Back => state.retreat()?,
        FlowAction::Reset => state = FlowState::new(),
    }

    Ok(state)
}

// =============================================================================
// Unit Tests
// =============================================================================
