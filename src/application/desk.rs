use super::attendance::AttendanceBook;
use super::classes::ClassRegistry;
use super::payments::PaymentLedger;
use super::teachers::TeacherRegistry;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::{Clock, IdGenerator, Randomness, SharedStore};
use crate::domain::search::Query;
use crate::error::Outcome;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::ids::TimestampIds;
use crate::infrastructure::random::ThreadRandom;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Label shown when a foreign key does not resolve.
pub const UNASSIGNED: &str = "Unassigned";

/// The injectable collaborators shared by the registries.
#[derive(Clone)]
pub struct Services {
    pub ids: Arc<dyn IdGenerator>,
    pub random: Arc<dyn Randomness>,
    pub clock: Arc<dyn Clock>,
}

impl Default for Services {
    fn default() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            ids: Arc::new(TimestampIds::new(clock.clone())),
            random: Arc::new(ThreadRandom),
            clock,
        }
    }
}

/// Dashboard figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub teachers: usize,
    pub classes: usize,
    pub payments: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Sum of completed payment amounts.
    pub revenue: Decimal,
}

/// The registries wired to one store.
pub struct Desk {
    pub teachers: TeacherRegistry,
    pub classes: Arc<ClassRegistry>,
    pub payments: Arc<PaymentLedger>,
    pub attendance: AttendanceBook,
    clock: Arc<dyn Clock>,
}

impl Desk {
    pub fn new(store: SharedStore, services: Services) -> Self {
        Self::with_success_probability(
            store,
            services,
            super::payments::DEFAULT_SUCCESS_PROBABILITY,
        )
    }

    pub fn with_success_probability(
        store: SharedStore,
        services: Services,
        success_probability: f64,
    ) -> Self {
        let Services { ids, random, clock } = services;
        let payments = Arc::new(
            PaymentLedger::new(store.clone(), ids.clone(), random, clock.clone())
                .with_success_probability(success_probability),
        );
        let classes = Arc::new(ClassRegistry::new(
            store.clone(),
            payments.clone(),
            ids.clone(),
        ));
        let teachers =
            TeacherRegistry::new(store.clone(), classes.clone(), payments.clone(), ids);
        Self {
            teachers,
            classes,
            payments,
            attendance: AttendanceBook::new(store),
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The teacher's name, or [`UNASSIGNED`] when the id does not resolve.
    pub async fn teacher_label(&self, teacher_id: &str) -> Outcome<String> {
        self.teachers.get(teacher_id).await.map(|teacher| {
            teacher
                .map(|t| t.name)
                .unwrap_or_else(|| UNASSIGNED.to_string())
        })
    }

    /// The class name, or [`UNASSIGNED`] when the id does not resolve.
    pub async fn class_label(&self, class_id: &str) -> Outcome<String> {
        self.classes.get(class_id).await.map(|class| {
            class
                .map(|c| c.name)
                .unwrap_or_else(|| UNASSIGNED.to_string())
        })
    }

    /// Payments whose description, teacher name or class name contains
    /// `text`, ignoring case. Dangling references match on description only.
    pub async fn search_payments(&self, text: &str) -> Outcome<Vec<Payment>> {
        let query = Query::new(text);
        let teachers = self.teachers.list().await;
        let classes = self.classes.list().await;
        let payments = self.payments.list().await;

        let teacher_names: HashMap<_, _> = teachers
            .value
            .iter()
            .map(|t| (t.id.as_str(), t.name.as_str()))
            .collect();
        let class_names: HashMap<_, _> = classes
            .value
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();

        let found = payments
            .value
            .into_iter()
            .filter(|p| {
                query.matches(&p.description)
                    || teacher_names
                        .get(p.teacher_id.as_str())
                        .is_some_and(|name| query.matches(name))
                    || class_names
                        .get(p.class_id.as_str())
                        .is_some_and(|name| query.matches(name))
            })
            .collect();

        let mut outcome = Outcome::with_faults(found, teachers.faults);
        outcome.absorb(classes.faults);
        outcome.absorb(payments.faults);
        outcome
    }

    pub async fn summary(&self) -> Outcome<Summary> {
        let teachers = self.teachers.list().await;
        let classes = self.classes.list().await;
        let payments = self.payments.list().await;

        let mut summary = Summary {
            teachers: teachers.value.len(),
            classes: classes.value.len(),
            payments: payments.value.len(),
            ..Default::default()
        };
        for payment in &payments.value {
            match payment.status {
                PaymentStatus::Pending => summary.pending += 1,
                PaymentStatus::Processing => summary.processing += 1,
                PaymentStatus::Completed => {
                    summary.completed += 1;
                    summary.revenue += payment.amount.value();
                }
                PaymentStatus::Failed => summary.failed += 1,
            }
        }

        let mut outcome = Outcome::with_faults(summary, teachers.faults);
        outcome.absorb(classes.faults);
        outcome.absorb(payments.faults);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::class::ClassPatch;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    fn desk() -> Desk {
        Desk::new(Arc::new(InMemoryStore::new()), Services::default())
    }

    #[tokio::test]
    async fn test_summary_of_seed_data() {
        let summary = desk().summary().await;
        assert!(summary.is_clean());
        assert_eq!(
            summary.value,
            Summary {
                teachers: 3,
                classes: 3,
                payments: 3,
                pending: 1,
                processing: 0,
                completed: 2,
                failed: 0,
                revenue: dec!(950),
            }
        );
    }

    #[tokio::test]
    async fn test_labels_fall_back_to_unassigned() {
        let desk = desk();
        assert_eq!(desk.teacher_label("1").await.value, "Dr. Sarah Johnson");
        assert_eq!(desk.teacher_label("ghost").await.value, UNASSIGNED);
        assert_eq!(desk.class_label("3").await.value, "Grade 10 English");
        assert_eq!(desk.class_label("ghost").await.value, UNASSIGNED);
    }

    #[tokio::test]
    async fn test_label_after_reassignment_to_missing_teacher() {
        let desk = desk();
        let class = desk
            .classes
            .update(
                "1",
                ClassPatch {
                    teacher_id: Some("gone".to_string()),
                    ..Default::default()
                },
            )
            .await
            .value
            .unwrap();
        assert_eq!(desk.teacher_label(&class.teacher_id).await.value, UNASSIGNED);
    }

    #[tokio::test]
    async fn test_search_payments_by_names_and_description() {
        let desk = desk();
        let ids = |all: Vec<Payment>| all.into_iter().map(|p| p.id).collect::<Vec<_>>();

        assert_eq!(ids(desk.search_payments("wilson").await.value), vec!["3"]);
        assert_eq!(ids(desk.search_payments("physics").await.value), vec!["2"]);
        assert_eq!(ids(desk.search_payments("june 2025").await.value), vec!["1", "2", "3"]);
        assert!(desk.search_payments("unassigned").await.value.is_empty());
    }

    #[tokio::test]
    async fn test_nan_success_rate_is_not_kept() {
        let desk = Desk::with_success_probability(
            Arc::new(InMemoryStore::new()),
            Services::default(),
            f64::NAN,
        );
        assert_eq!(
            desk.payments.success_probability(),
            crate::application::payments::DEFAULT_SUCCESS_PROBABILITY
        );
        let processed = desk.payments.process("2").await.value.unwrap().unwrap();
        assert!(processed.is_consistent());
    }
}
