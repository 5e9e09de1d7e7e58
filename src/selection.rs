//! Table "select all" checkbox.

use std::rc::Rc;

use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};

const SELECT_ALL_ID: &str = "selectAll";
const ROW_CHECKBOXES: &str = ".table-container tbody input[type=\"checkbox\"]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectAllState {
    Unchecked,
    Checked,
    /// Some but not all rows checked. The checked flag is left as it was.
    Indeterminate,
}

pub fn select_all_state(checked: usize, total: usize) -> SelectAllState {
    if checked == 0 {
        SelectAllState::Unchecked
    } else if checked == total {
        SelectAllState::Checked
    } else {
        SelectAllState::Indeterminate
    }
}

pub struct SelectAll<H: Host> {
    host: Rc<H>,
    control: H::Element,
}

impl<H: Host> SelectAll<H> {
    pub fn attach(host: Rc<H>) -> Option<Rc<Self>> {
        let control = host.element_by_id(SELECT_ALL_ID)?;
        let this = Rc::new(Self { host, control });

        let weak = Rc::downgrade(&this);
        this.host.listen(
            ListenTarget::Element(this.control.clone()),
            EventKind::Change,
            Box::new(move |_| {
                if let Some(this) = weak.upgrade() {
                    this.apply_to_rows();
                }
                Handled::Continue
            }),
        );

        for row in this.rows() {
            let weak = Rc::downgrade(&this);
            this.host.listen(
                ListenTarget::Element(row),
                EventKind::Change,
                Box::new(move |_| {
                    if let Some(this) = weak.upgrade() {
                        this.refresh();
                    }
                    Handled::Continue
                }),
            );
        }
        Some(this)
    }

    fn rows(&self) -> Vec<H::Element> {
        self.host.query_all(ROW_CHECKBOXES)
    }

    /// Copy the control's checked state to every row.
    pub fn apply_to_rows(&self) {
        let checked = self.control.checked();
        for row in self.rows() {
            row.set_checked(checked);
        }
    }

    /// Recompute the control from the rows.
    pub fn refresh(&self) -> SelectAllState {
        let rows = self.rows();
        let checked = rows.iter().filter(|r| r.checked()).count();
        let state = select_all_state(checked, rows.len());
        match state {
            SelectAllState::Unchecked => {
                self.control.set_indeterminate(false);
                self.control.set_checked(false);
            }
            SelectAllState::Checked => {
                self.control.set_indeterminate(false);
                self.control.set_checked(true);
            }
            SelectAllState::Indeterminate => self.control.set_indeterminate(true),
        }
        state
    }
}
