use std::sync::Arc;

use checkout_engine::traits::{
    ChargeInitiated,
    ChargeRequest,
    GatewayError,
    PaymentGateway,
    PaymentGuidance,
    VerifiedPayment,
    VerifiedStatus,
};
use mockall::mock;

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        fn provider_name(&self) -> String;
        async fn initiate(&self, request: ChargeRequest) -> Result<ChargeInitiated, GatewayError>;
        async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError>;
    }
}

/// Lets the checkout and settlement APIs share one mock, so expectations are counted across both.
#[derive(Clone)]
pub struct SharedGateway(Arc<MockGateway>);

impl SharedGateway {
    pub fn new(mock: MockGateway) -> Self {
        Self(Arc::new(mock))
    }
}

impl PaymentGateway for SharedGateway {
    fn provider_name(&self) -> String {
        self.0.provider_name()
    }

    async fn initiate(&self, request: ChargeRequest) -> Result<ChargeInitiated, GatewayError> {
        self.0.initiate(request).await
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        self.0.verify(reference).await
    }
}

/// A mock that accepts every charge and prompts the payer's phone.
pub fn accepting_gateway() -> MockGateway {
    let mut mock = MockGateway::new();
    mock.expect_provider_name().return_const("paystack".to_string());
    mock.expect_initiate().returning(|req| {
        Ok(ChargeInitiated { provider_reference: req.reference, guidance: PaymentGuidance::default(), raw: None })
    });
    mock
}

/// Adds a verify expectation that reports `status` for every reference.
pub fn verifying_as(mut mock: MockGateway, status: VerifiedStatus) -> MockGateway {
    mock.expect_verify().returning(move |reference| {
        Ok(VerifiedPayment::new(reference, status).with_raw(format!(r#"{{"status":"{status}"}}"#)))
    });
    mock
}
