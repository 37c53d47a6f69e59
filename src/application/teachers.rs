use super::classes::{CascadeSummary, ClassRegistry};
use super::collection::{Collection, Loaded};
use super::payments::PaymentLedger;
use crate::domain::ports::{IdGenerator, SharedStore};
use crate::domain::search::Query;
use crate::domain::teacher::{NewTeacher, Teacher, TeacherPatch};
use crate::error::Outcome;
use std::sync::Arc;
use tracing::info;

/// Owns teacher records. Deleting a teacher removes the teacher's classes
/// and payments.
pub struct TeacherRegistry {
    teachers: Collection<Teacher>,
    classes: Arc<ClassRegistry>,
    payments: Arc<PaymentLedger>,
    ids: Arc<dyn IdGenerator>,
}

impl TeacherRegistry {
    pub fn new(
        store: SharedStore,
        classes: Arc<ClassRegistry>,
        payments: Arc<PaymentLedger>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            teachers: Collection::new(store),
            classes,
            payments,
            ids,
        }
    }

    pub async fn list(&self) -> Outcome<Vec<Teacher>> {
        self.teachers.list().await
    }

    pub async fn get(&self, id: &str) -> Outcome<Option<Teacher>> {
        self.teachers.get(id).await
    }

    /// Teachers whose name contains `text`, ignoring case.
    pub async fn search(&self, text: &str) -> Outcome<Vec<Teacher>> {
        let query = Query::new(text);
        self.list()
            .await
            .map(|all| all.into_iter().filter(|t| query.matches(&t.name)).collect())
    }

    pub async fn create(&self, fields: NewTeacher) -> Outcome<Teacher> {
        let teacher = fields.into_teacher(self.ids.next_id());
        info!(id = %teacher.id, "Teacher created");
        self.teachers.insert(teacher).await
    }

    pub async fn update(&self, id: &str, patch: TeacherPatch) -> Outcome<Option<Teacher>> {
        self.teachers.update(id, patch).await
    }

    /// Deletes the teacher, then the teacher's payments and classes.
    ///
    /// Payments go first, then classes, then the teacher itself, and every
    /// touched snapshot is written before returning. A failed write does
    /// not stop the remaining ones. `None` when the id is unknown; nothing
    /// else is touched in that case.
    pub async fn delete(&self, id: &str) -> Outcome<Option<CascadeSummary>> {
        let Loaded {
            mut snapshot,
            mut faults,
        } = self.teachers.open().await;
        let Some(index) = snapshot.position(id) else {
            return Outcome::with_faults(None, faults);
        };

        let payments = self.payments.delete_by_teacher(id).await;
        let classes = self.classes.delete_by_teacher(id).await;
        snapshot.records.remove(index);
        faults.extend(self.teachers.persist(&snapshot).await);
        faults.extend(payments.faults);
        faults.extend(classes.faults);

        let summary = CascadeSummary {
            classes_removed: classes.value,
            payments_removed: payments.value,
        };
        info!(
            id,
            classes_removed = summary.classes_removed,
            payments_removed = summary.payments_removed,
            "Teacher deleted"
        );
        Outcome::with_faults(Some(summary), faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::class::NewClass;
    use crate::domain::payment::Amount;
    use crate::domain::ports::Clock;
    use crate::domain::record::Record;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::ids::TimestampIds;
    use crate::infrastructure::in_memory::InMemoryStore;
    use crate::infrastructure::random::FixedOutcome;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: InMemoryStore,
        teachers: TeacherRegistry,
        classes: Arc<ClassRegistry>,
        payments: Arc<PaymentLedger>,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let shared: SharedStore = Arc::new(store.clone());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids: Arc<dyn IdGenerator> = Arc::new(TimestampIds::new(clock.clone()));
        let payments = Arc::new(PaymentLedger::new(
            shared.clone(),
            ids.clone(),
            Arc::new(FixedOutcome::success()),
            clock,
        ));
        let classes = Arc::new(ClassRegistry::new(
            shared.clone(),
            payments.clone(),
            ids.clone(),
        ));
        let teachers = TeacherRegistry::new(shared, classes.clone(), payments.clone(), ids);
        Fixture {
            store,
            teachers,
            classes,
            payments,
        }
    }

    fn new_teacher(name: &str) -> NewTeacher {
        NewTeacher {
            name: name.to_string(),
            email: "a@school.edu".to_string(),
            phone: String::new(),
            subject: "History".to_string(),
            join_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            profile_image: String::new(),
        }
    }

    fn new_class(teacher_id: &str) -> NewClass {
        NewClass {
            name: "World History".to_string(),
            subject: "History".to_string(),
            teacher_id: teacher_id.to_string(),
            schedule: "Mon 08:00".to_string(),
            room: "12".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_seeds_on_first_access() {
        let f = fixture();
        assert_eq!(f.teachers.list().await.value, Teacher::seed());
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let f = fixture();
        let updated = f
            .teachers
            .update(
                "2",
                TeacherPatch {
                    subject: Some("Astronomy".to_string()),
                    ..Default::default()
                },
            )
            .await
            .value
            .unwrap();
        assert_eq!(updated.subject, "Astronomy");
        assert_eq!(updated.name, "Prof. Michael Chen");
        assert_eq!(f.teachers.list().await.value[1], updated);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_classes_and_payments() {
        let f = fixture();
        let teacher = f.teachers.create(new_teacher("A")).await.value;
        let class = f.classes.create(new_class(&teacher.id)).await.value;
        let payment = f
            .payments
            .initiate(&teacher.id, &class.id, Amount::new(dec!(90)).unwrap(), "fee")
            .await
            .value;

        let summary = f.teachers.delete(&teacher.id).await.value.unwrap();
        assert_eq!(summary.classes_removed, 1);
        assert_eq!(summary.payments_removed, 1);

        assert!(f.teachers.get(&teacher.id).await.value.is_none());
        assert!(f.classes.get(&class.id).await.value.is_none());
        assert!(f.payments.get(&payment.id).await.value.is_none());
    }

    #[tokio::test]
    async fn test_delete_leaves_other_teachers_records() {
        let f = fixture();
        let seeded_classes = f.classes.for_teacher("2").await.value.len();

        f.teachers.delete("1").await;

        assert!(f.classes.for_teacher("1").await.value.is_empty());
        assert!(f.payments.for_teacher("1").await.value.is_empty());
        assert_eq!(f.classes.for_teacher("2").await.value.len(), seeded_classes);
        assert!(!f.payments.for_teacher("2").await.value.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_teacher_is_a_no_op() {
        let f = fixture();
        let classes = f.classes.list().await.value;
        let payments = f.payments.list().await.value;

        assert!(f.teachers.delete("missing").await.value.is_none());
        assert_eq!(f.teachers.list().await.value.len(), 3);
        assert_eq!(f.classes.list().await.value, classes);
        assert_eq!(f.payments.list().await.value, payments);
    }

    #[tokio::test]
    async fn test_cascade_completes_despite_write_faults() {
        let f = fixture();
        f.teachers.list().await;
        f.classes.list().await;
        f.payments.list().await;

        f.store.set_simulate_write_error(true);
        let outcome = f.teachers.delete("1").await;

        // Every touched snapshot reports its own failed write.
        let mut keys: Vec<_> = outcome.faults.iter().map(|fault| fault.key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["classes", "payments", "teachers"]);

        // The session view is still consistent across the three registries.
        assert!(f.teachers.get("1").await.value.is_none());
        assert!(f.classes.for_teacher("1").await.value.is_empty());
        assert!(f.payments.for_teacher("1").await.value.is_empty());
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let f = fixture();
        let names: Vec<_> = f
            .teachers
            .search("CHEN")
            .await
            .value
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Prof. Michael Chen"]);
        // Subject is not searched.
        assert!(f.teachers.search("Literature").await.value.is_empty());
        assert_eq!(f.teachers.search("").await.value.len(), 3);
    }
}
