use tracing::{info, warn};

use crate::builder::{BuildAttempt, BuilderResponse, TxBuilder};
use crate::decode::{decode_payload, CanonicalTransaction, DecodePolicy};
use crate::domain::TradeIntent;
use crate::error::ResolveError;

/// Turns a trade intent into a decoded transaction using the primary builder,
/// falling back to the secondary one at most once.
#[derive(Debug, Clone)]
pub struct Resolver<B> {
    builder: B,
    policy: DecodePolicy,
}

impl<B: TxBuilder> Resolver<B> {
    pub fn new(builder: B, policy: DecodePolicy) -> Self {
        Self { builder, policy }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub async fn spot(
        &self,
        mint: &str,
        wallet_address: &str,
        amount: &str,
    ) -> Result<CanonicalTransaction, ResolveError> {
        self.resolve(&TradeIntent::spot(mint, wallet_address, amount)).await
    }

    pub async fn leverage(
        &self,
        mint: &str,
        wallet_address: &str,
        amount: &str,
    ) -> Result<CanonicalTransaction, ResolveError> {
        self.resolve(&TradeIntent::leverage(mint, wallet_address, amount)).await
    }

    /// Primary -> (on no payload) secondary -> decode.
    ///
    /// Tiers run strictly in sequence. Once a payload is accepted its decode
    /// result is final: a malformed payload never triggers the other tier.
    pub async fn resolve(&self, intent: &TradeIntent) -> Result<CanonicalTransaction, ResolveError> {
        intent.validate()?;

        let winner = self.select(intent).await?;
        info!(
            backend = %winner.tier,
            kind = %intent.kind,
            encoding = %winner.encoding,
            "resolver.payload_selected"
        );

        let tx = decode_payload(&winner.encoded_transaction, winner.encoding, self.policy).map_err(|e| {
            warn!(backend = %winner.tier, error = %e, "resolver.decode_failed");
            e
        })?;
        info!(encoding = %tx.encoding(), "resolver.done");
        Ok(tx)
    }

    async fn select(&self, intent: &TradeIntent) -> Result<BuilderResponse, ResolveError> {
        let primary = self.builder.request_primary(intent).await;
        let primary_timed_out = primary.is_timeout();
        if let BuildAttempt::Built(resp) = primary {
            return Ok(resp);
        }
        info!(kind = %intent.kind, timed_out = primary_timed_out, "resolver.fallback");

        let secondary = self.builder.request_secondary(intent).await;
        let secondary_timed_out = secondary.is_timeout();
        if let BuildAttempt::Built(resp) = secondary {
            return Ok(resp);
        }

        if primary_timed_out && secondary_timed_out {
            warn!(kind = %intent.kind, mint = %intent.mint, "resolver.timeout");
            Err(ResolveError::RequestTimeout)
        } else {
            warn!(kind = %intent.kind, mint = %intent.mint, "resolver.no_route");
            Err(ResolveError::NoRouteFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::Client;

    use super::*;
    use crate::builder::{BackendTier, BuilderClient};
    use crate::config::Config;
    use crate::decode::fixtures::{legacy_b64, versioned_b64};
    use crate::decode::TxEncoding;
    use crate::domain::IntentKind;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const WALLET: &str = "AbcWa11et1111111111111111111111111111111111";

    #[derive(Debug, Clone)]
    enum Reply {
        Tx(String),
        NoRoute,
        Timeout,
    }

    impl Reply {
        fn attempt(&self, tier: BackendTier) -> BuildAttempt {
            match self {
                Reply::Tx(tx) => BuildAttempt::Built(BuilderResponse {
                    encoded_transaction: tx.clone(),
                    encoding: tier.assumed_encoding(),
                    tier,
                }),
                Reply::NoRoute => BuildAttempt::NoRoute("no tx".into()),
                Reply::Timeout => BuildAttempt::TimedOut,
            }
        }
    }

    struct FakeBuilder {
        primary: Reply,
        secondary: Reply,
        primary_calls: AtomicUsize,
        secondary_calls: AtomicUsize,
    }

    impl FakeBuilder {
        fn new(primary: Reply, secondary: Reply) -> Self {
            Self {
                primary,
                secondary,
                primary_calls: AtomicUsize::new(0),
                secondary_calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> (usize, usize) {
            (
                self.primary_calls.load(Ordering::SeqCst),
                self.secondary_calls.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl TxBuilder for FakeBuilder {
        async fn request_primary(&self, _intent: &TradeIntent) -> BuildAttempt {
            self.primary_calls.fetch_add(1, Ordering::SeqCst);
            self.primary.attempt(BackendTier::Primary)
        }

        async fn request_secondary(&self, _intent: &TradeIntent) -> BuildAttempt {
            self.secondary_calls.fetch_add(1, Ordering::SeqCst);
            self.secondary.attempt(BackendTier::Secondary)
        }
    }

    fn resolver(primary: Reply, secondary: Reply) -> Resolver<FakeBuilder> {
        Resolver::new(FakeBuilder::new(primary, secondary), DecodePolicy::Detect)
    }

    #[tokio::test]
    async fn primary_payload_wins_and_secondary_is_never_called() {
        for kind in [IntentKind::Spot, IntentKind::Leverage] {
            let r = resolver(Reply::Tx(versioned_b64()), Reply::Tx(legacy_b64()));
            let tx = r.resolve(&TradeIntent::new(kind, BONK, WALLET, "1.5")).await.unwrap();
            assert_eq!(tx.encoding(), TxEncoding::Versioned);
            assert_eq!(r.builder().calls(), (1, 0));
        }
    }

    #[tokio::test]
    async fn falls_back_to_secondary_when_primary_has_no_route() {
        let r = resolver(Reply::NoRoute, Reply::Tx(legacy_b64()));
        let tx = r.spot(BONK, WALLET, "1.5").await.unwrap();
        assert_eq!(tx.encoding(), TxEncoding::Legacy);
        assert_eq!(r.builder().calls(), (1, 1));
    }

    #[tokio::test]
    async fn primary_timeout_still_falls_back() {
        let r = resolver(Reply::Timeout, Reply::Tx(legacy_b64()));
        let tx = r.leverage(BONK, WALLET, "3").await.unwrap();
        assert_eq!(tx.encoding(), TxEncoding::Legacy);
    }

    #[tokio::test]
    async fn both_unusable_is_no_route_after_exactly_two_calls() {
        let r = resolver(Reply::NoRoute, Reply::NoRoute);
        assert_eq!(r.spot(BONK, WALLET, "1.5").await.unwrap_err(), ResolveError::NoRouteFound);
        assert_eq!(r.builder().calls(), (1, 1));

        let r = resolver(Reply::Timeout, Reply::NoRoute);
        assert_eq!(r.spot(BONK, WALLET, "1.5").await.unwrap_err(), ResolveError::NoRouteFound);
    }

    #[tokio::test]
    async fn both_timed_out_is_request_timeout() {
        let r = resolver(Reply::Timeout, Reply::Timeout);
        let err = r.spot(BONK, WALLET, "1.5").await.unwrap_err();
        assert_eq!(err, ResolveError::RequestTimeout);
        assert!(err.is_recoverable());
        assert_eq!(r.builder().calls(), (1, 1));
    }

    #[tokio::test]
    async fn malformed_primary_payload_short_circuits() {
        let r = resolver(Reply::Tx("not-valid-base64!!".into()), Reply::Tx(legacy_b64()));
        let err = r.spot(BONK, WALLET, "1.5").await.unwrap_err();
        assert!(matches!(err, ResolveError::MalformedTransaction(_)));
        assert!(!err.is_recoverable());
        assert_eq!(r.builder().calls(), (1, 0));
    }

    #[tokio::test]
    async fn malformed_secondary_payload_is_reported() {
        let r = resolver(Reply::NoRoute, Reply::Tx("AAAA".into()));
        let err = r.spot(BONK, WALLET, "1.5").await.unwrap_err();
        assert!(matches!(err, ResolveError::MalformedTransaction(_)));
    }

    #[tokio::test]
    async fn invalid_intent_makes_no_calls() {
        let r = resolver(Reply::Tx(versioned_b64()), Reply::Tx(legacy_b64()));
        for (mint, wallet, amount) in [("", WALLET, "1"), (BONK, " ", "1"), (BONK, WALLET, "0"), (BONK, WALLET, "x")] {
            let err = r.spot(mint, wallet, amount).await.unwrap_err();
            assert!(matches!(err, ResolveError::InvalidIntent(_)));
        }
        assert_eq!(r.builder().calls(), (0, 0));
    }

    #[tokio::test]
    async fn strict_policy_tags_by_backend() {
        // Legacy bytes from the aggregator are read through the versioned envelope.
        let r = Resolver::new(
            FakeBuilder::new(Reply::Tx(legacy_b64()), Reply::NoRoute),
            DecodePolicy::Strict,
        );
        let tx = r.spot(BONK, WALLET, "1").await.unwrap();
        assert_eq!(tx.encoding(), TxEncoding::Versioned);
    }

    /// Replies chosen per mint, so one resolver can serve different outcomes.
    struct PerMintBuilder {
        replies: HashMap<String, (Reply, Reply)>,
        calls: AtomicUsize,
    }

    impl PerMintBuilder {
        async fn reply(&self, intent: &TradeIntent, tier: BackendTier) -> BuildAttempt {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let (primary, secondary) = &self.replies[&intent.mint];
            match tier {
                BackendTier::Primary => primary.attempt(tier),
                BackendTier::Secondary => secondary.attempt(tier),
            }
        }
    }

    #[async_trait]
    impl TxBuilder for PerMintBuilder {
        async fn request_primary(&self, intent: &TradeIntent) -> BuildAttempt {
            self.reply(intent, BackendTier::Primary).await
        }

        async fn request_secondary(&self, intent: &TradeIntent) -> BuildAttempt {
            self.reply(intent, BackendTier::Secondary).await
        }
    }

    #[tokio::test]
    async fn concurrent_resolves_do_not_interfere() {
        let replies = HashMap::from([
            ("mint-a".to_string(), (Reply::Tx(versioned_b64()), Reply::NoRoute)),
            ("mint-b".to_string(), (Reply::NoRoute, Reply::Tx(legacy_b64()))),
            ("mint-c".to_string(), (Reply::Timeout, Reply::NoRoute)),
        ]);
        let r = Resolver::new(
            PerMintBuilder { replies, calls: AtomicUsize::new(0) },
            DecodePolicy::Detect,
        );

        let (a, b, c) = tokio::join!(
            r.spot("mint-a", WALLET, "1"),
            r.leverage("mint-b", WALLET, "2"),
            r.spot("mint-c", WALLET, "3"),
        );

        assert_eq!(a.unwrap().encoding(), TxEncoding::Versioned);
        assert_eq!(b.unwrap().encoding(), TxEncoding::Legacy);
        assert_eq!(c.unwrap_err(), ResolveError::NoRouteFound);
        assert_eq!(r.builder().calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn resolves_over_http_with_fallback() {
        let mut server = mockito::Server::new_async().await;
        let primary = server
            .mock("POST", "/jup/spot")
            .with_status(200)
            .with_body(r#"{"message":"no route"}"#)
            .expect(1)
            .create_async()
            .await;
        let secondary = server
            .mock("POST", "/pump/spot")
            .with_status(200)
            .with_body(format!(r#"{{"tx":"{}"}}"#, legacy_b64()))
            .expect(1)
            .create_async()
            .await;

        let cfg = Config {
            aggregator_base_url: format!("{}/jup", server.url()),
            direct_pool_base_url: format!("{}/pump", server.url()),
            ..Config::default()
        }
        .validated()
        .unwrap();
        let r = Resolver::new(BuilderClient::new(&cfg, Client::new()), cfg.decode_policy());

        let tx = r.spot(BONK, WALLET, "1.5").await.unwrap();
        primary.assert_async().await;
        secondary.assert_async().await;
        assert_eq!(tx.encoding(), TxEncoding::Legacy);
    }

    #[tokio::test]
    async fn http_both_without_tx_is_no_route() {
        let mut server = mockito::Server::new_async().await;
        let primary = server.mock("POST", "/jup/leverage").with_status(200).with_body("{}").expect(1).create_async().await;
        let secondary = server.mock("POST", "/pump/leverage").with_status(404).expect(1).create_async().await;

        let cfg = Config {
            aggregator_base_url: format!("{}/jup", server.url()),
            direct_pool_base_url: format!("{}/pump", server.url()),
            ..Config::default()
        }
        .validated()
        .unwrap();
        let r = Resolver::new(BuilderClient::new(&cfg, Client::new()), DecodePolicy::Detect);

        assert_eq!(r.leverage(BONK, WALLET, "2").await.unwrap_err(), ResolveError::NoRouteFound);
        primary.assert_async().await;
        secondary.assert_async().await;
    }
}
