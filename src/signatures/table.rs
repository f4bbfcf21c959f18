//! Provider signature table
//!
//! This module holds the fingerprint tokens identifying subscription-commerce
//! providers in page content. The table is flat data: an ordered list of
//! provider names, each with the substring tokens that betray its presence
//! (widget class names, app proxy paths, data attributes, UI strings).
//!
//! The built-in table ships 46 named providers plus a generic fallback
//! bucket; an external TOML file can replace it wholesale.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Name of the fallback bucket matched by generic subscription markers
///
/// Reported only when no named provider matched anywhere on the store.
pub const GENERIC_PROVIDER: &str = "Generic Subscription";

/// Built-in fingerprints: (provider name, detection tokens)
///
/// Token order within a provider is irrelevant (any hit detects); provider
/// order is preserved into reports as first-encountered order.
const BUILTIN_SIGNATURES: &[(&str, &[&str])] = &[
    (
        "Recharge Subscriptions",
        &["rc_container", "/apps/recharge/", "data-recharge-provider", "Subscribe & Save", "recharge"],
    ),
    (
        "Bold Subscriptions",
        &["bold-ro__product", "/apps/subscriptions/", "bold_recurring_id", "Recurring Order", "boldapps"],
    ),
    (
        "Appstle Subscriptions",
        &["appstle_init", "/apps/appstle-subscriptions/", "data-appstle-plan", "Subscription Management", "appstle"],
    ),
    (
        "Seal Subscriptions",
        &["seal-subs", "/apps/seal-subscriptions/", "data-seal-id", "Auto-ship", "seal-subscriptions"],
    ),
    (
        "Skio Subscriptions",
        &["skio-plan-picker", "/a/skio/", "data-skio-plan-id", "Passwordless Login", "skio"],
    ),
    (
        "Loop Subscriptions",
        &["loop-subscription-widget", "/a/loop_subscriptions/", "data-loop-id", "Delivered Monthly", "loopwork"],
    ),
    (
        "Stay AI",
        &["stay-ai-widget", "/a/stay/", "data-stay-plan", "Retention Engine", "stayai"],
    ),
    (
        "Ordergroove",
        &["og-offer", "/apps/ordergroove/", "data-og-module", "Subscription Link", "ordergroove"],
    ),
    (
        "Smartrr",
        &["smartrr-widget", "/a/smartrr/", "data-smartrr-id", "Account Portal", "smartrr"],
    ),
    (
        "PayWhirl",
        &["paywhirl-widget", "/apps/paywhirl/", "data-paywhirl-id", "Billing Portal", "paywhirl"],
    ),
    (
        "Ongoing Subscriptions",
        &["ongoing-subscription-widget", "/apps/ongoing/", "ongoing_id", "Automatic Billing"],
    ),
    (
        "Subify",
        &["subify-subscription-widget", "/apps/subify/", "data-subify-plan", "Periodic Discount", "subify"],
    ),
    (
        "Native Shopify Subscriptions",
        &["selling_plan", "selling_plan_id", "selling_plan_groups"],
    ),
    (
        "Recurpay",
        &["recurpay-widget", "/apps/recurpay/", "data-recurpay-id", "Self Service", "recurpay"],
    ),
    (
        "Propel Subscriptions",
        &["propel-widget", "/apps/propel/", "data-propel-plan", "Fixed Price"],
    ),
    (
        "Monto Subscriptions",
        &["monto-subscription-widget", "/apps/monto/", "data-monto-plan", "Recurring Logic"],
    ),
    (
        "Simple Subscriptions",
        &["simple-sub-widget", "/apps/simple-sub/", "data-simple-plan", "Billing Interval"],
    ),
    (
        "CASA Subscriptions",
        &["casa-widget", "/a/casa/", "data-casa-plan", "Direct-to-consumer"],
    ),
    (
        "Gronos Subscriptions",
        &["gronos-widget", "/apps/gronos/", "data-gronos-id", "Simple Setup"],
    ),
    (
        "Subbly",
        &["subbly-checkout", "/a/subbly/", "data-subbly-id", "Checkout Builder", "subbly"],
    ),
    (
        "ChargeBee",
        &["chargebee-widget", "/apps/chargebee/", "data-cb-plan-id", "Enterprise Billing", "chargebee"],
    ),
    (
        "Recurly",
        &["recurly-widget", "/apps/recurly/", "data-recurly-id", "Revenue Recovery", "recurly"],
    ),
    (
        "Spur Subscriptions",
        &["spur-widget", "/a/spur/", "data-spur-id", "Mobile Optimized"],
    ),
    (
        "Beboxed",
        &["beboxed-widget", "/apps/beboxed/", "data-beboxed-id", "Curation"],
    ),
    (
        "Upscribe",
        &["upscribe-widget", "/a/upscribe/", "data-upscribe-id", "LTV Tracking", "upscribe"],
    ),
    (
        "Zest Subscriptions",
        &["zest-widget", "/a/zest/", "data-zest-id", "Food & Beverage"],
    ),
    (
        "Klaviyo Subscriptions",
        &["klaviyo-sub-widget", "/apps/klaviyo/", "data-klaviyo-id", "Email Logic"],
    ),
    (
        "ChargeZen",
        &["chargezen-widget", "/a/chargezen/", "data-chargezen-id", "Optimization"],
    ),
    (
        "Retentio",
        &["retentio-widget", "/a/retentio/", "data-retentio-id", "Exit Intent"],
    ),
    (
        "Subscrimo",
        &["subscrimo-widget", "/a/subscrimo/", "data-subscrimo-id", "Visual Editor"],
    ),
    (
        "Growave Subscriptions",
        &["growave-sub-widget", "/apps/growave/", "data-growave-id", "Recurring Points", "growave"],
    ),
    (
        "Yotpo Subscriptions",
        &["yotpo-sub-widget", "/apps/yotpo/", "data-yotpo-id", "Subscription Rewards", "yotpo"],
    ),
    (
        "Smile Subscriptions",
        &["smile-sub-widget", "/apps/smile/", "data-smile-id", "Referral Plan"],
    ),
    (
        "Rivo Subscriptions",
        &["rivo-sub-widget", "/a/rivo/", "data-rivo-id", "Retention Platform", "rivo"],
    ),
    (
        "LoyaltyLion Subscriptions",
        &["lion-sub-widget", "/apps/loyaltylion/", "data-lion-id", "Reward Strategy"],
    ),
    (
        "Rebuy Subscriptions",
        &["rebuy-sub-widget", "/apps/rebuy/", "data-rebuy-id", "AI Recommendations", "rebuy"],
    ),
    (
        "Hulk Subscriptions",
        &["hulk-sub-widget", "/apps/hulk-apps/", "data-hulk-id", "Recurring Discount"],
    ),
    (
        "Vitals Subscriptions",
        &["vitals-sub-widget", "/apps/vitals/", "data-vitals-id", "Subscription Logic", "vitals"],
    ),
    (
        "EasySub",
        &["easysub-widget", "/a/easysub/", "data-easysub-id", "One-click Billing"],
    ),
    (
        "Prime Subscriptions",
        &["prime-sub-widget", "/apps/prime/", "data-prime-id", "Digital Products"],
    ),
    (
        "Subscription Plus",
        &["plus-sub-widget", "/apps/subplus/", "data-plus-id", "Trial Management"],
    ),
    (
        "QPilot",
        &["qpilot-widget", "/apps/qpilot/", "data-qpilot-id", "Autoship Cloud", "qpilot"],
    ),
    (
        "Subflow",
        &["subflow-widget", "/a/subflow/", "data-subflow-id", "Flow Management"],
    ),
    (
        "Kaching Subscriptions",
        &["kaching-widget", "/a/kaching/", "data-kaching-id", "Billing Logic"],
    ),
    (
        "Plobal Subscriptions",
        &["plobal-sub-widget", "/apps/plobal/", "data-plobal-id", "Mobile App"],
    ),
    (
        "Tapcart Subscriptions",
        &["tapcart-sub-widget", "/apps/tapcart/", "data-tapcart-id", "Mobile Commerce"],
    ),
    (
        GENERIC_PROVIDER,
        &[
            "subscribe-and-save",
            "subscription-widget",
            "subscription_form",
            "subscription-plan",
            "auto-renew",
            "autorenew",
            "subscribe_button",
            "recurring-billing",
            "membership-plan",
            "subscribe-save",
            "subscribe--save",
        ],
    ),
];

/// One provider's fingerprint entry
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSignature {
    pub name: String,
    pub tokens: Vec<String>,
}

/// The ordered provider fingerprint table
///
/// Read-only for the lifetime of a run; shared across scan tasks behind an
/// `Arc`. Tokens are stored pre-lowercased so matching never re-normalizes.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureTable {
    #[serde(rename = "provider")]
    providers: Vec<ProviderSignature>,
}

impl SignatureTable {
    /// Builds the built-in 46-provider table plus the generic bucket
    pub fn builtin() -> Self {
        let providers = BUILTIN_SIGNATURES
            .iter()
            .map(|(name, tokens)| ProviderSignature {
                name: name.to_string(),
                tokens: tokens.iter().map(|t| t.to_lowercase()).collect(),
            })
            .collect();
        Self { providers }
    }

    /// Loads a replacement table from a TOML file
    ///
    /// Expected shape:
    ///
    /// ```toml
    /// [[provider]]
    /// name = "Recharge Subscriptions"
    /// tokens = ["rc_container", "recharge"]
    /// ```
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML signature file
    ///
    /// # Returns
    ///
    /// * `Ok(SignatureTable)` - Parsed and validated table
    /// * `Err(ConfigError)` - File unreadable, malformed, or empty
    pub fn from_toml_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut table: SignatureTable = toml::from_str(&content)?;
        table.validate()?;
        for provider in &mut table.providers {
            for token in &mut provider.tokens {
                *token = token.to_lowercase();
            }
        }
        Ok(table)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.providers.is_empty() {
            return Err(ConfigError::Validation(
                "signature table must define at least one provider".to_string(),
            ));
        }
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "signature table contains a provider with an empty name".to_string(),
                ));
            }
            if provider.tokens.iter().all(|t| t.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "provider '{}' has no usable tokens",
                    provider.name
                )));
            }
        }
        Ok(())
    }

    pub fn providers(&self) -> &[ProviderSignature] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Computes a SHA-256 fingerprint of the table contents
    ///
    /// Recorded in every shard artifact so the merger can tell when shards
    /// were scanned with differing tables.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for provider in &self.providers {
            hasher.update(provider.name.as_bytes());
            hasher.update(b"\t");
            hasher.update(provider.tokens.join(",").as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
