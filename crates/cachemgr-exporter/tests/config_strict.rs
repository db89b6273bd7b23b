#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use cachemgr_exporter::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
cachemgr:
  hostname: "squid"
  prot: 3128 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.exporter.listen, "0.0.0.0:9301");
    assert_eq!(cfg.cachemgr.hostname, "localhost");
    assert_eq!(cfg.cachemgr.port, 3128);
    assert_eq!(cfg.cachemgr.user_agent, "squidclient/3.5.12");
    assert_eq!(cfg.cachemgr.proxy_source.to_string(), "127.0.0.1:80");
    assert!(!cfg.cachemgr.proxy_header);
    assert!(cfg.cachemgr.fetch_timeout_ms.is_none());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
exporter:
  listen: "127.0.0.1:9000"
cachemgr:
  hostname: "squid.internal"
  port: 3129
  login: "admin"
  password: "pw"
  proxy_header: true
  user_agent: "probe/2"
  proxy_source: "10.0.0.1:4000"
  proxy_destination_ip: "10.0.0.2"
  fetch_timeout_ms: 2500
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.cachemgr.port, 3129);
    assert_eq!(cfg.cachemgr.fetch_timeout_ms, Some(2500));
    assert_eq!(cfg.cachemgr.proxy_destination_ip.to_string(), "10.0.0.2");
}

#[test]
fn rejects_bad_values() {
    let cases = [
        "version: 2\n",
        "version: 1\nexporter:\n  listen: \"nope\"\n",
        "version: 1\ncachemgr:\n  hostname: \"\"\n",
        "version: 1\ncachemgr:\n  port: 0\n",
        "version: 1\ncachemgr:\n  password: \"orphan\"\n",
        "version: 1\ncachemgr:\n  fetch_timeout_ms: 5\n",
        "version: 1\ncachemgr:\n  proxy_source: \"::1\"\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.kind().as_str(), "CONFIG", "case={c:?}");
    }
}

#[test]
fn env_overrides_apply_before_validation() {
    let env: HashMap<&str, &str> = [
        ("CACHEMGR_HOSTNAME", "from-env"),
        ("CACHEMGR_PORT", "3130"),
        ("CACHEMGR_LOGIN", "ops"),
        ("CACHEMGR_PASSWORD", "pw"),
        ("CACHEMGR_PROXY_HEADER", "1"),
    ]
    .into_iter()
    .collect();

    let cfg = config::load_with_env("version: 1\n", |k| env.get(k).map(|v| v.to_string()))
        .expect("must parse");
    assert_eq!(cfg.cachemgr.hostname, "from-env");
    assert_eq!(cfg.cachemgr.port, 3130);
    assert_eq!(cfg.cachemgr.login, "ops");
    assert!(cfg.cachemgr.proxy_header);

    let err = config::load_with_env("version: 1\n", |k| {
        (k == "CACHEMGR_PORT").then(|| "http".to_string())
    })
    .expect_err("bad port");
    assert_eq!(err.kind().as_str(), "CONFIG");
}
