//! Property-based tests for the access key codec.

#![allow(clippy::unwrap_used)]

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use keystack_auth::{
    AccessKeyCodec, AccessKeyMetadata, AccessKeyPrefix, AccessPathTuple, CodecError,
    EncryptionPassword, parse, to_opaque,
};
use keystack_core::{Environment, TenantId};
use proptest::prelude::*;

fn codec(password: &str) -> AccessKeyCodec {
    AccessKeyCodec::new(EncryptionPassword::new(password).unwrap())
}

fn arb_password() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{32}"
}

fn arb_prefix() -> impl Strategy<Value = AccessKeyPrefix> {
    prop::sample::select(AccessKeyPrefix::ALL.to_vec())
}

fn arb_metadata() -> impl Strategy<Value = AccessKeyMetadata> {
    (
        "[a-zA-Z0-9_-]{1,24}",
        "[a-z_]{1,12}",
        prop_oneof![Just(Environment::Test), Just(Environment::Live)],
        "[a-z-]{1,16}",
        "[a-z0-9_-]{1,32}",
        ("\\PC{0,24}", "\\PC{0,24}", "\\PC{0,24}"),
    )
        .prop_map(
            |(tenant, namespace, environment, event_type, group, (event, object_id, timestamp))| {
                AccessKeyMetadata {
                    buildable_id: TenantId::new(tenant).unwrap(),
                    namespace,
                    environment,
                    event_type,
                    group,
                    paths: AccessPathTuple {
                        event,
                        object_id,
                        timestamp,
                    },
                }
            },
        )
}

proptest! {
    /// verify(generate(T)) returns T for every prefix and password.
    #[test]
    fn test_should_roundtrip_any_metadata(
        password in arb_password(),
        prefix in arb_prefix(),
        meta in arb_metadata(),
    ) {
        let codec = codec(&password);
        let key = codec.generate_for(prefix, &meta);
        prop_assert_eq!(key.prefix(), prefix);
        prop_assert_eq!(codec.verify(key.as_str()).unwrap(), meta);
    }

    /// A key never verifies under a different password.
    #[test]
    fn test_should_reject_any_other_password(
        a in arb_password(),
        b in arb_password(),
        meta in arb_metadata(),
    ) {
        prop_assume!(a != b);
        let key = codec(&a).generate_for(AccessKeyPrefix::SecretLive, &meta);
        prop_assert_eq!(
            codec(&b).verify(key.as_str()).unwrap_err(),
            CodecError::TamperedOrWrongPassword
        );
    }

    /// Flipping any bit of the decoded ciphertext or IV is detected.
    #[test]
    fn test_should_detect_any_bit_flip(
        meta in arb_metadata(),
        in_iv in any::<bool>(),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let codec = codec("0123456789abcdef0123456789abcdef");
        let key = codec.generate_for(AccessKeyPrefix::IdentifierTest, &meta);
        let mut parsed = parse(key.as_str()).unwrap();

        let field = if in_iv { &mut parsed.iv } else { &mut parsed.content };
        let mut bytes = URL_SAFE_NO_PAD.decode(field.as_str()).unwrap();
        let i = index.index(bytes.len());
        bytes[i] ^= 1 << bit;
        *field = URL_SAFE_NO_PAD.encode(bytes);

        let triple = format!("{}%{}%{}", parsed.content, parsed.iv, parsed.hash);
        let tampered = format!("{}_{}", parsed.prefix, to_opaque(&triple));
        prop_assert!(codec.verify(&tampered).is_err());
    }

    /// Two generations of the same tuple differ but verify identically.
    #[test]
    fn test_should_never_repeat_keys(meta in arb_metadata()) {
        let codec = codec("0123456789abcdef0123456789abcdef");
        let a = codec.generate_for(AccessKeyPrefix::SecretTest, &meta);
        let b = codec.generate_for(AccessKeyPrefix::SecretTest, &meta);
        prop_assert_ne!(a.as_str(), b.as_str());
        prop_assert_eq!(codec.verify(a.as_str()).unwrap(), codec.verify(b.as_str()).unwrap());
    }

    /// Arbitrary input never panics and never verifies.
    #[test]
    fn test_should_reject_arbitrary_input(input in "\\PC{0,128}") {
        let codec = codec("0123456789abcdef0123456789abcdef");
        prop_assert!(codec.verify(&input).is_err());
    }

    /// Arbitrary bodies behind a valid prefix never panic.
    #[test]
    fn test_should_reject_arbitrary_body(prefix in arb_prefix(), body in "[A-Za-z0-9_-]{0,96}") {
        let codec = codec("0123456789abcdef0123456789abcdef");
        let key = format!("{prefix}_{body}");
        prop_assert!(codec.verify(&key).is_err());
    }
}
