use super::collection::{Collection, Loaded};
use crate::domain::payment::{
    Amount, Payment, PaymentPatch, PaymentStatus, TRANSACTION_PREFIX,
};
use crate::domain::ports::{Clock, IdGenerator, Randomness, SharedStore};
use crate::domain::record::Record;
use crate::error::{DeskError, Outcome, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Probability that simulated processing settles a payment.
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.8;

const TRANSACTION_TOKEN_LEN: usize = 4;

/// Owns payment records and the simulated processing flow.
///
/// `Pending -> Completed | Failed` in a single synchronous step. A payment
/// that already reached a terminal status is not processed again.
pub struct PaymentLedger {
    payments: Collection<Payment>,
    ids: Arc<dyn IdGenerator>,
    random: Arc<dyn Randomness>,
    clock: Arc<dyn Clock>,
    success_probability: f64,
}

impl PaymentLedger {
    pub fn new(
        store: SharedStore,
        ids: Arc<dyn IdGenerator>,
        random: Arc<dyn Randomness>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payments: Collection::new(store),
            ids,
            random,
            clock,
            success_probability: DEFAULT_SUCCESS_PROBABILITY,
        }
    }

    /// Overrides the processing success probability; clamped to `[0, 1]`.
    /// NaN keeps [`DEFAULT_SUCCESS_PROBABILITY`].
    pub fn with_success_probability(mut self, probability: f64) -> Self {
        if probability.is_nan() {
            warn!("Success probability is NaN, keeping the default");
            self.success_probability = DEFAULT_SUCCESS_PROBABILITY;
        } else {
            self.success_probability = probability.clamp(0.0, 1.0);
        }
        self
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    pub async fn list(&self) -> Outcome<Vec<Payment>> {
        self.payments.list().await
    }

    pub async fn get(&self, id: &str) -> Outcome<Option<Payment>> {
        self.payments.get(id).await
    }

    pub async fn for_teacher(&self, teacher_id: &str) -> Outcome<Vec<Payment>> {
        self.list()
            .await
            .map(|all| all.into_iter().filter(|p| p.teacher_id == teacher_id).collect())
    }

    pub async fn for_class(&self, class_id: &str) -> Outcome<Vec<Payment>> {
        self.list()
            .await
            .map(|all| all.into_iter().filter(|p| p.class_id == class_id).collect())
    }

    /// Records a new `Pending` payment dated today.
    pub async fn initiate(
        &self,
        teacher_id: &str,
        class_id: &str,
        amount: Amount,
        description: &str,
    ) -> Outcome<Payment> {
        let payment = Payment::pending(
            self.ids.next_id(),
            teacher_id.to_string(),
            class_id.to_string(),
            amount,
            description.to_string(),
            self.clock.today(),
        );
        info!(id = %payment.id, teacher_id, class_id, amount = %amount, "Payment initiated");
        self.payments.insert(payment).await
    }

    /// Runs the simulated processor on a non-terminal payment.
    ///
    /// The value is `Ok(None)` for an unknown id and
    /// [`DeskError::InvalidTransition`] when the payment is already
    /// `Completed` or `Failed`. Load faults are reported either way.
    pub async fn process(&self, id: &str) -> Outcome<Result<Option<Payment>>> {
        let Loaded {
            mut snapshot,
            mut faults,
        } = self.payments.open().await;
        let Some(index) = snapshot.position(id) else {
            debug!(id, "Payment not found");
            return Outcome::with_faults(Ok(None), faults);
        };

        let payment = &mut snapshot.records[index];
        if payment.status.is_terminal() {
            let err = DeskError::InvalidTransition {
                id: id.to_string(),
                status: payment.status.to_string(),
            };
            return Outcome::with_faults(Err(err), faults);
        }

        if self.random.chance(self.success_probability) {
            payment.complete(self.transaction_id());
        } else {
            payment.fail();
        }
        info!(id, status = %payment.status, "Payment processed");

        let processed = payment.clone();
        faults.extend(self.payments.persist(&snapshot).await);
        Outcome::with_faults(Ok(Some(processed)), faults)
    }

    /// Administrative edit. Any status may be set; the transaction id follows
    /// the status so the invariant still holds.
    pub async fn update(&self, id: &str, patch: PaymentPatch) -> Outcome<Option<Payment>> {
        self.payments
            .modify(id, |payment| {
                payment.apply(patch);
                if payment.status == PaymentStatus::Completed && payment.transaction_id.is_none()
                {
                    payment.transaction_id = Some(self.transaction_id());
                }
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Outcome<bool> {
        self.payments.remove(id).await
    }

    /// Removes every payment owed to the teacher. Returns how many went.
    pub async fn delete_by_teacher(&self, teacher_id: &str) -> Outcome<usize> {
        self.payments
            .remove_where(|p| p.teacher_id == teacher_id)
            .await
    }

    /// Removes every payment for the class. Returns how many went.
    pub async fn delete_by_class(&self, class_id: &str) -> Outcome<usize> {
        self.payments.remove_where(|p| p.class_id == class_id).await
    }

    fn transaction_id(&self) -> String {
        format!(
            "{}{}{}",
            TRANSACTION_PREFIX,
            self.clock.now_millis(),
            self.random.token(TRANSACTION_TOKEN_LEN)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::KeyValueStore;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ids::TimestampIds;
    use crate::infrastructure::in_memory::InMemoryStore;
    use crate::infrastructure::random::{FixedOutcome, SeededRandom, ThreadRandom};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn ledger(random: impl Randomness + 'static) -> PaymentLedger {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(today(), 1_717_200_000_000));
        PaymentLedger::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(TimestampIds::new(clock.clone())),
            Arc::new(random),
            clock,
        )
    }

    fn fee() -> Amount {
        Amount::new(dec!(500)).unwrap()
    }

    #[tokio::test]
    async fn test_initiate_creates_pending_payment() {
        let ledger = ledger(FixedOutcome::success());
        let payment = ledger.initiate("1", "1", fee(), "June fee").await.value;

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.date, today());
        assert_eq!(payment.transaction_id, None);
        assert_eq!(payment.description, "June fee");
        assert!(ledger.get(&payment.id).await.value.is_some());
    }

    #[tokio::test]
    async fn test_process_success_assigns_transaction_id() {
        let ledger = ledger(FixedOutcome::success());
        let payment = ledger.initiate("1", "1", fee(), "June fee").await.value;

        let processed = ledger.process(&payment.id).await.value.unwrap().unwrap();
        assert_eq!(processed.status, PaymentStatus::Completed);
        let txn = processed.transaction_id.unwrap();
        assert!(txn.starts_with("TXN"));
        assert!(txn.len() > 3);
    }

    #[tokio::test]
    async fn test_process_failure_has_no_transaction_id() {
        let ledger = ledger(FixedOutcome::failure());
        let payment = ledger.initiate("1", "1", fee(), "June fee").await.value;

        let processed = ledger.process(&payment.id).await.value.unwrap().unwrap();
        assert_eq!(processed.status, PaymentStatus::Failed);
        assert_eq!(processed.transaction_id, None);

        let stored = ledger.get(&payment.id).await.value.unwrap();
        assert_eq!(stored, processed);
    }

    #[tokio::test]
    async fn test_terminal_payment_is_not_reprocessed() {
        let ledger = ledger(FixedOutcome::failure());
        let payment = ledger.initiate("1", "1", fee(), "June fee").await.value;
        ledger.process(&payment.id).await.value.unwrap();

        let err = ledger.process(&payment.id).await.value.unwrap_err();
        assert!(matches!(err, DeskError::InvalidTransition { .. }));
        assert_eq!(
            ledger.get(&payment.id).await.value.unwrap().status,
            PaymentStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_process_unknown_id() {
        let ledger = ledger(FixedOutcome::success());
        let before = ledger.list().await.value;
        assert!(ledger.process("missing").await.value.unwrap().is_none());
        assert_eq!(ledger.list().await.value, before);
    }

    #[tokio::test]
    async fn test_seeded_processing_keeps_invariant() {
        let ledger = ledger(SeededRandom::new(42));
        for i in 0..40 {
            let payment = ledger
                .initiate("1", "1", fee(), &format!("fee {}", i))
                .await
                .value;
            ledger.process(&payment.id).await.value.unwrap();
        }
        let all = ledger.list().await.value;
        assert!(all.iter().all(Payment::is_consistent));
        assert!(all.iter().any(|p| p.status == PaymentStatus::Completed));
    }

    #[tokio::test]
    async fn test_update_can_force_status() {
        let ledger = ledger(FixedOutcome::success());
        let payment = ledger.initiate("1", "1", fee(), "June fee").await.value;

        let completed = ledger
            .update(
                &payment.id,
                PaymentPatch {
                    status: Some(PaymentStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .value
            .unwrap();
        assert!(completed.transaction_id.is_some());

        let reopened = ledger
            .update(
                &payment.id,
                PaymentPatch {
                    status: Some(PaymentStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .value
            .unwrap();
        assert_eq!(reopened.transaction_id, None);
    }

    #[tokio::test]
    async fn test_bulk_deletes_are_scoped_and_idempotent() {
        let ledger = ledger(FixedOutcome::success());
        ledger.initiate("t1", "c1", fee(), "a").await;
        ledger.initiate("t1", "c2", fee(), "b").await;
        ledger.initiate("t2", "c2", fee(), "c").await;

        assert_eq!(ledger.delete_by_class("c2").await.value, 2);
        assert_eq!(ledger.delete_by_class("c2").await.value, 0);
        assert_eq!(ledger.for_teacher("t1").await.value.len(), 1);
        assert_eq!(ledger.delete_by_teacher("t1").await.value, 1);
        assert!(ledger.for_class("c1").await.value.is_empty());
    }

    #[tokio::test]
    async fn test_success_probability_is_clamped() {
        let ledger = ledger(FixedOutcome::success()).with_success_probability(1.7);
        assert_eq!(ledger.success_probability(), 1.0);
    }

    #[tokio::test]
    async fn test_nan_success_probability_falls_back_to_default() {
        let ledger = ledger(ThreadRandom).with_success_probability(f64::NAN);
        assert_eq!(ledger.success_probability(), DEFAULT_SUCCESS_PROBABILITY);

        let payment = ledger.initiate("1", "1", fee(), "June fee").await.value;
        let processed = ledger.process(&payment.id).await.value.unwrap().unwrap();
        assert!(processed.status.is_terminal());
        assert!(processed.is_consistent());
    }

    #[tokio::test]
    async fn test_rejected_process_still_reports_load_faults() {
        let store = InMemoryStore::new();
        let bad = r#"{"id":"x","teacherId":"1","classId":"1","amount":0,"date":"2024-06-01","status":"Pending","description":"zero"}"#;
        let done = r#"{"id":"d","teacherId":"1","classId":"1","amount":5,"date":"2024-06-01","status":"Failed","description":"done"}"#;
        store
            .set("payments", format!("[{},{}]", bad, done).into_bytes())
            .await
            .unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(today(), 1_717_200_000_000));
        let ledger = PaymentLedger::new(
            Arc::new(store),
            Arc::new(TimestampIds::new(clock.clone())),
            Arc::new(FixedOutcome::success()),
            clock,
        );

        let outcome = ledger.process("d").await;
        assert!(matches!(outcome.value, Err(DeskError::InvalidTransition { .. })));
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.faults[0].key, "payments");
    }
}
