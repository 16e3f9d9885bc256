//! Drives the registry contract through a realistic history, replays the events it
//! emitted, and checks the read model agrees with the contract's own answers.

use std::collections::BTreeMap;
use std::sync::Arc;

use cosmwasm_std::testing::{
    mock_dependencies, mock_env, mock_info, MockApi, MockQuerier, MockStorage,
};
use cosmwasm_std::{from_binary, Binary, Env, OwnedDeps};
use subname_indexer::config::ProjectorConfig;
use subname_indexer::envelope::{Checkpoint, LogPosition, RawLog};
use subname_indexer::model::NodeId;
use subname_indexer::projector::Projector;
use subname_indexer::query::{NameFilter, Page, QueryApi};
use subname_indexer::source::MemorySource;
use subname_indexer::store::{MemoryStore, ReadModelStore};
use subname_registry::contract::{execute, instantiate, query};
use subnames::registry::{
    ExecuteMsg, ExpiryResponse, InstantiateMsg, OwnerOfResponse, QueryMsg,
};
use subnames::resolver::RecordsResponse;
use subnames::utils::{encode_node, namehash};
use tokio::sync::watch;

const YEAR: u64 = 365 * 24 * 60 * 60;

/// A contract instance plus the event log its transactions produced.
struct Chain {
    deps: OwnedDeps<MockStorage, MockApi, MockQuerier>,
    env: Env,
    logs: Vec<RawLog>,
}

impl Chain {
    fn new() -> Self {
        let mut deps = mock_dependencies(&[]);
        let msg = InstantiateMsg {
            base_node: encode_node(&namehash("celo.eth")),
            base_name: String::from("celo.eth"),
            base_uri: String::from("https://names.example/"),
            registrars: vec![String::from("registrar")],
            admins: vec![],
        };
        instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), msg).unwrap();
        Self {
            deps,
            env: mock_env(),
            logs: Vec::new(),
        }
    }

    fn now(&self) -> u64 {
        self.env.block.time.seconds()
    }

    fn advance(&mut self, seconds: u64) {
        self.env.block.time = self.env.block.time.plus_seconds(seconds);
        self.env.block.height += 1 + seconds / 5;
    }

    /// One transaction per block.
    fn exec(&mut self, sender: &str, msg: ExecuteMsg) {
        let res = execute(self.deps.as_mut(), self.env.clone(), mock_info(sender, &[]), msg)
            .unwrap();
        let height = self.env.block.height;
        for (index, event) in res.events.into_iter().enumerate() {
            self.logs.push(RawLog::new(
                LogPosition::new(height, index as u32),
                format!("{:X}", height),
                event,
            ));
        }
        self.advance(5);
    }

    fn register(&mut self, label: &str, owner: &str, expiry: u64) {
        self.exec(
            "registrar",
            ExecuteMsg::CreateOrRenew {
                node: node(label),
                label: String::from(label),
                owner: String::from(owner),
                expiry,
            },
        );
    }

    fn set_text(&mut self, sender: &str, label: &str, key: &str, value: &str) {
        self.exec(
            sender,
            ExecuteMsg::SetText {
                node: node(label),
                key: String::from(key),
                value: String::from(value),
            },
        );
    }

    fn owner_of(&self, label: &str) -> Option<String> {
        let res = query(
            self.deps.as_ref(),
            self.env.clone(),
            QueryMsg::OwnerOf { node: node(label) },
        )
        .unwrap();
        let value: OwnerOfResponse = from_binary(&res).unwrap();
        value.owner.map(String::from)
    }

    fn expiry(&self, label: &str) -> u64 {
        let res = query(
            self.deps.as_ref(),
            self.env.clone(),
            QueryMsg::Expiry { node: node(label) },
        )
        .unwrap();
        let value: ExpiryResponse = from_binary(&res).unwrap();
        value.expiry
    }

    fn records(&self, label: &str) -> RecordsResponse {
        let res = query(
            self.deps.as_ref(),
            self.env.clone(),
            QueryMsg::Records { node: node(label) },
        )
        .unwrap();
        from_binary(&res).unwrap()
    }
}

fn node(label: &str) -> Vec<u8> {
    namehash(&format!("{}.celo.eth", label))
}

fn config() -> ProjectorConfig {
    ProjectorConfig {
        root_name: String::from("celo.eth"),
        workers: 4,
        batch_size: 3,
        poll_interval_ms: 10,
        backoff_base_ms: 1,
        backoff_max_ms: 10,
    }
}

fn history() -> Chain {
    let mut chain = Chain::new();
    let expiry = chain.now() + YEAR;

    chain.register("alice", "alice", expiry);
    chain.register("bob", "bob", expiry);
    chain.register("carol", "carol", expiry);

    chain.set_text("alice", "alice", "url", "https://alice.example");
    chain.set_text("alice", "alice", "url", "https://alice.example/v2");
    chain.set_text("alice", "alice", "email", "alice@example.com");
    chain.exec(
        "alice",
        ExecuteMsg::SetNativeAddress {
            node: node("alice"),
            address: Binary::from(vec![1u8; 20]),
        },
    );
    chain.exec(
        "alice",
        ExecuteMsg::SetAddress {
            node: node("alice"),
            coin_type: 60,
            address: Binary::from(vec![2u8; 20]),
        },
    );
    chain.exec(
        "alice",
        ExecuteMsg::SetAddress {
            node: node("alice"),
            coin_type: 52752,
            address: Binary::from(vec![3u8; 20]),
        },
    );
    chain.exec(
        "alice",
        ExecuteMsg::SetContenthash {
            node: node("alice"),
            hash: Some(Binary::from(vec![0xe3, 0x01, 0x01])),
        },
    );

    chain.exec(
        "bob",
        ExecuteMsg::Transfer {
            node: node("bob"),
            from: String::from("bob"),
            to: String::from("dave"),
        },
    );
    chain.exec(
        "dave",
        ExecuteMsg::SetContenthash {
            node: node("bob"),
            hash: Some(Binary::from(vec![9u8; 4])),
        },
    );
    chain.exec(
        "dave",
        ExecuteMsg::SetContenthash {
            node: node("bob"),
            hash: None,
        },
    );

    chain.exec(
        "carol",
        ExecuteMsg::SetContenthash {
            node: node("carol"),
            hash: Some(Binary::from(vec![7u8; 4])),
        },
    );
    // An empty hash is a clear, on the ledger and in the event
    chain.exec(
        "carol",
        ExecuteMsg::SetContenthash {
            node: node("carol"),
            hash: Some(Binary::default()),
        },
    );

    let carol_expiry = chain.now() + 60;
    chain.exec(
        "creator",
        ExecuteMsg::SetExpiry {
            node: node("carol"),
            expiry: carol_expiry,
        },
    );
    chain.register("mallory", "mallory", expiry);
    chain.exec(
        "creator",
        ExecuteMsg::Revoke {
            node: node("mallory"),
        },
    );

    // Two years later alice has lapsed and erin picks the name up
    chain.advance(2 * YEAR);
    let erin_expiry = chain.now() + YEAR;
    chain.register("alice", "erin", erin_expiry);
    chain.set_text("erin", "alice", "url", "https://erin.example");

    chain
}

async fn project(logs: Vec<RawLog>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let source = MemorySource::new();
    source.extend(logs);
    let (_tx, rx) = watch::channel(false);
    let projector = Projector::new(store.clone(), Arc::new(source), config(), rx);
    projector.catch_up().await.unwrap();
    store
}

async fn assert_matches_ledger(chain: &Chain, store: Arc<MemoryStore>) {
    let api = QueryApi::new(store);
    let now = chain.now();

    for label in ["alice", "bob", "carol", "mallory"] {
        let view = api
            .by_node(&NodeId::from(node(label)), NameFilter::all_at(now))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{} missing from read model", label));
        let projected_owner = if view.active { view.owner.clone() } else { None };
        assert_eq!(projected_owner, chain.owner_of(label), "owner of {}", label);
        assert_eq!(view.expiry, chain.expiry(label), "expiry of {}", label);

        let ledger = chain.records(label);
        let record = api
            .records(&NodeId::from(node(label)))
            .await
            .unwrap()
            .unwrap_or_default();

        let ledger_addresses: BTreeMap<u64, Vec<u8>> = ledger
            .addresses
            .iter()
            .map(|entry| (entry.coin_type, entry.address.to_vec()))
            .collect();
        let projected_addresses: BTreeMap<u64, Vec<u8>> = record
            .addresses
            .iter()
            .map(|entry| (entry.coin_type, entry.address.clone()))
            .collect();
        assert_eq!(projected_addresses, ledger_addresses, "addresses of {}", label);

        let ledger_texts: BTreeMap<String, String> = ledger
            .texts
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect();
        let projected_texts: BTreeMap<String, String> = record
            .texts
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect();
        assert_eq!(projected_texts, ledger_texts, "texts of {}", label);

        assert_eq!(
            record.contenthash,
            ledger.contenthash.map(|hash| hash.to_vec()),
            "contenthash of {}",
            label
        );
    }
}

#[tokio::test]
async fn test_read_model_matches_ledger() {
    let chain = history();
    let store = project(chain.logs.clone()).await;
    assert_matches_ledger(&chain, store.clone()).await;

    let api = QueryApi::new(store.clone());
    let now = chain.now();

    let alice = api
        .by_node(&NodeId::from(node("alice")), NameFilter::all_at(now))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alice.full_name, "alice.celo.eth");
    assert_eq!(alice.owner.as_deref(), Some("erin"));
    assert_eq!(alice.registration.unwrap().tx_hash, alice.creation_tx);

    // Carol's shortened expiry and mallory's revocation have both taken effect
    let active = api
        .names(NameFilter::active_at(now), Page::default())
        .await
        .unwrap();
    let labels: Vec<&str> = active.items.iter().map(|view| view.label.as_str()).collect();
    assert_eq!(labels, vec!["alice"]);

    let everything = api
        .names(NameFilter::all_at(now), Page::default())
        .await
        .unwrap();
    assert_eq!(everything.total, 4);

    let checkpoint = store.checkpoint().await.unwrap();
    assert_eq!(checkpoint.cursor, chain.logs.len() as u64);
    assert_eq!(checkpoint.position, chain.logs.last().map(RawLog::position));
}

#[tokio::test]
async fn test_redelivered_log_projects_the_same_model() {
    let chain = history();
    let once = project(chain.logs.clone()).await;

    // At-least-once delivery: every log arrives twice, out of order
    let mut doubled = chain.logs.clone();
    doubled.extend(chain.logs.iter().rev().cloned());
    let twice = project(doubled).await;

    let mut a = once.snapshot().await.unwrap();
    let mut b = twice.snapshot().await.unwrap();
    assert_eq!(a.checkpoint.position, b.checkpoint.position);
    a.checkpoint = Checkpoint::default();
    b.checkpoint = Checkpoint::default();
    assert_eq!(a, b);
    assert_matches_ledger(&chain, twice).await;
}

#[tokio::test]
async fn test_interleaved_delivery_projects_the_same_model() {
    let chain = history();
    let once = project(chain.logs.clone()).await;

    // Each node's logs stay in order, but whole nodes arrive one after another, so most
    // logs reach the projector after a higher position of another node was committed
    let mut grouped = chain.logs.clone();
    grouped.sort_by_key(|log| log.decode().map(|decoded| decoded.node()).ok());
    assert_ne!(grouped, chain.logs);
    let interleaved = project(grouped).await;

    let mut a = once.snapshot().await.unwrap();
    let mut b = interleaved.snapshot().await.unwrap();
    assert_eq!(a.checkpoint, b.checkpoint);
    a.checkpoint = Checkpoint::default();
    b.checkpoint = Checkpoint::default();
    assert_eq!(a, b);
    assert_matches_ledger(&chain, interleaved).await;
}
