//! A scripted, in-memory [`PaymentGateway`] for tests.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::traits::{
    ChargeInitiated,
    ChargeRequest,
    GatewayError,
    PaymentGateway,
    PaymentGuidance,
    VerifiedPayment,
    VerifiedStatus,
};

#[derive(Debug, Default)]
struct FakeGatewayState {
    fail_initiate: bool,
    fail_verify: bool,
    verdicts: HashMap<String, VerifiedStatus>,
    charges: Vec<ChargeRequest>,
    verify_calls: usize,
}

/// Clones share the same script, so a test can keep a handle while the APIs own their copies.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeGatewayState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_initiate(&self, fail: bool) {
        self.state.lock().unwrap().fail_initiate = fail;
    }

    pub fn fail_verify(&self, fail: bool) {
        self.state.lock().unwrap().fail_verify = fail;
    }

    /// What `verify` reports for the reference. References without a verdict are `Pending`.
    pub fn set_verdict(&self, reference: &str, status: VerifiedStatus) {
        self.state.lock().unwrap().verdicts.insert(reference.to_string(), status);
    }

    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.state.lock().unwrap().charges.clone()
    }

    pub fn verify_calls(&self) -> usize {
        self.state.lock().unwrap().verify_calls
    }
}

impl PaymentGateway for FakeGateway {
    fn provider_name(&self) -> String {
        "fake".to_string()
    }

    async fn initiate(&self, request: ChargeRequest) -> Result<ChargeInitiated, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_initiate {
            return Err(GatewayError::Unavailable("scripted failure".into()));
        }
        let provider_reference = request.reference.clone();
        state.charges.push(request);
        Ok(ChargeInitiated { provider_reference, guidance: PaymentGuidance::default(), raw: None })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.verify_calls += 1;
        if state.fail_verify {
            return Err(GatewayError::Unavailable("scripted failure".into()));
        }
        let status = state.verdicts.get(reference).copied().unwrap_or(VerifiedStatus::Pending);
        Ok(VerifiedPayment::new(reference, status).with_raw(format!(r#"{{"status":"{status}"}}"#)))
    }
}
