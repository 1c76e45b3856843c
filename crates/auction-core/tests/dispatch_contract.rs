//! Contract Test: First-Match Dispatch
//!
//! Constraints verified:
//! - The first server in registry order that claims an input wins
//! - Misses are `None`, never errors
//! - Malformed URLs fail the call
//! - Resolution never adds or reorders servers

mod common;

use auction_core::traits::same_server;
use auction_core::{DispatchResolver, Error, ServerRegistry};
use common::*;
use std::sync::Arc;

fn registry_of(servers: &[Arc<MockServer>]) -> Arc<ServerRegistry> {
    let registry = Arc::new(ServerRegistry::new());
    for server in servers {
        registry.add_server(as_server(server));
    }
    registry
}

#[test]
fn first_claiming_server_wins() {
    let p1 = MockServer::new("p1").claiming("1").shared();
    // p2 would also claim "123"
    let p2 = MockServer::new("p2").claiming("12").shared();
    let resolver = DispatchResolver::new(registry_of(&[p1.clone(), p2.clone()]));

    let found = resolver.resolve_by_identifier("123").expect("p1 claims it");
    assert!(same_server(&found, &as_server(&p1)));

    let found = resolver.resolve_by_identifier("2").map(|s| s.name().to_string());
    assert_eq!(found, None);
}

#[test]
fn registry_order_decides_not_specificity() {
    let p2 = MockServer::new("p2").claiming("2").shared();
    let p1 = MockServer::new("p1").claiming("1").shared();
    let resolver = DispatchResolver::new(registry_of(&[p2, p1]));

    assert_eq!(resolver.resolve_by_identifier("123").unwrap().name(), "p1");
    assert_eq!(resolver.resolve_by_identifier("234").unwrap().name(), "p2");
}

#[test]
fn unclaimed_identifier_is_absent() {
    let resolver = DispatchResolver::new(registry_of(&[MockServer::new("p1").claiming("1").shared()]));
    assert!(resolver.resolve_by_identifier("999").is_none());

    let empty = DispatchResolver::new(Arc::new(ServerRegistry::new()));
    assert!(empty.resolve_by_identifier("123").is_none());
}

#[test]
fn url_resolution_matches_host() {
    let ebay = MockServer::new("ebay").on_host("www.ebay.com").shared();
    let yahoo = MockServer::new("yahoo").on_host("auctions.yahoo.co.jp").shared();
    let resolver = DispatchResolver::new(registry_of(&[ebay, yahoo]));

    let found = resolver
        .resolve_by_url("https://auctions.yahoo.co.jp/item/x123")
        .unwrap()
        .expect("yahoo handles its host");
    assert_eq!(found.name(), "yahoo");
}

#[test]
fn unhandled_url_is_absent() {
    let resolver = DispatchResolver::new(registry_of(&[MockServer::new("ebay").on_host("www.ebay.com").shared()]));

    let found = resolver.resolve_by_url("https://example.org/listing/1").unwrap();
    assert!(found.is_none());
}

#[test]
fn malformed_url_fails_the_call() {
    let resolver = DispatchResolver::new(registry_of(&[MockServer::new("ebay").shared()]));

    let result = resolver.resolve_by_url("not a url at all");
    assert!(matches!(result, Err(Error::InvalidUrl(_))));
}

#[test]
fn resolution_does_not_change_registry() {
    let p1 = MockServer::new("p1").claiming("1").shared();
    let p2 = MockServer::new("p2").claiming("2").shared();
    let registry = registry_of(&[p1, p2]);
    let resolver = DispatchResolver::new(Arc::clone(&registry));

    for _ in 0..3 {
        resolver.resolve_by_identifier("200");
        resolver.resolve_by_identifier("100");
    }

    assert_eq!(registry.names(), ["p1", "p2"]);
}
