use super::collection::{Collection, Loaded};
use super::payments::PaymentLedger;
use crate::domain::class::{Class, ClassPatch, NewClass};
use crate::domain::ports::{IdGenerator, SharedStore};
use crate::domain::search::Query;
use crate::error::Outcome;
use std::sync::Arc;
use tracing::info;

/// Records removed alongside an owning record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub classes_removed: usize,
    pub payments_removed: usize,
}

/// Owns class records. Deleting a class removes its payments.
///
/// `teacher_id` is not checked against the teacher registry; consumers
/// resolve it with [`crate::application::desk::Desk::teacher_label`].
pub struct ClassRegistry {
    classes: Collection<Class>,
    payments: Arc<PaymentLedger>,
    ids: Arc<dyn IdGenerator>,
}

impl ClassRegistry {
    pub fn new(store: SharedStore, payments: Arc<PaymentLedger>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            classes: Collection::new(store),
            payments,
            ids,
        }
    }

    pub async fn list(&self) -> Outcome<Vec<Class>> {
        self.classes.list().await
    }

    pub async fn get(&self, id: &str) -> Outcome<Option<Class>> {
        self.classes.get(id).await
    }

    pub async fn for_teacher(&self, teacher_id: &str) -> Outcome<Vec<Class>> {
        self.list()
            .await
            .map(|all| all.into_iter().filter(|c| c.teacher_id == teacher_id).collect())
    }

    /// Classes whose name, subject or room contains `text`, ignoring case.
    pub async fn search(&self, text: &str) -> Outcome<Vec<Class>> {
        let query = Query::new(text);
        self.list().await.map(|all| {
            all.into_iter()
                .filter(|c| {
                    query.matches_any([c.name.as_str(), c.subject.as_str(), c.room.as_str()])
                })
                .collect()
        })
    }

    pub async fn create(&self, fields: NewClass) -> Outcome<Class> {
        let class = fields.into_class(self.ids.next_id());
        info!(id = %class.id, teacher_id = %class.teacher_id, "Class created");
        self.classes.insert(class).await
    }

    pub async fn update(&self, id: &str, patch: ClassPatch) -> Outcome<Option<Class>> {
        self.classes.update(id, patch).await
    }

    /// Deletes the class and every payment recorded against it.
    ///
    /// `None` when the id is unknown; no payment is touched in that case.
    pub async fn delete(&self, id: &str) -> Outcome<Option<CascadeSummary>> {
        let Loaded {
            mut snapshot,
            mut faults,
        } = self.classes.open().await;
        let Some(index) = snapshot.position(id) else {
            return Outcome::with_faults(None, faults);
        };

        let payments = self.payments.delete_by_class(id).await;
        snapshot.records.remove(index);
        faults.extend(self.classes.persist(&snapshot).await);
        faults.extend(payments.faults);

        let summary = CascadeSummary {
            classes_removed: 0,
            payments_removed: payments.value,
        };
        info!(id, payments_removed = summary.payments_removed, "Class deleted");
        Outcome::with_faults(Some(summary), faults)
    }

    /// Removes every class taught by the teacher. Payments are left to the
    /// caller. Returns how many classes went.
    pub async fn delete_by_teacher(&self, teacher_id: &str) -> Outcome<usize> {
        self.classes
            .remove_where(|c| c.teacher_id == teacher_id)
            .await
    }
}
