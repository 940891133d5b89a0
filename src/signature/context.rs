use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, Local};
use uuid::Uuid;

/// Source of the signing time written into the signed properties
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Source of the UUIDs used to build element identifiers
pub trait IdGenerator {
    fn next_id(&self) -> Uuid;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Counter backed UUIDs: the first call yields
/// `00000000-0000-0000-0000-000000000001`
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}

/// Identifiers of every element the signature references
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignatureIds {
    pub signature: String,
    pub signed_info: String,
    pub signature_value: String,
    pub certificate: String,
    pub certificate_ref: String,
    pub signed_properties: String,
    pub signed_properties_ref: String,
    pub signature_object: String,
    pub document_ref: String,
}

impl SignatureIds {
    pub fn generate(ids: &impl IdGenerator) -> Self {
        let next = |prefix: &str| format!("{prefix}-{}", ids.next_id());
        Self {
            signature: next("Signature"),
            signed_info: next("SignedInfo"),
            signature_value: next("SignatureValue"),
            certificate: next("Certificate"),
            certificate_ref: next("CertificateRef"),
            signed_properties: next("SignedProperties"),
            signed_properties_ref: next("SignedPropertiesRef"),
            signature_object: next("SignatureObject"),
            document_ref: next("DocumentRef"),
        }
    }
}
