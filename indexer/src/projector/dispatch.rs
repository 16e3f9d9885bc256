//! Reducers, one per event kind.
//!
//! Each reducer takes the node's current state by value and returns the next one. They
//! never touch the store, so replaying an event against the state it produced is a no-op.

use subnames::events::{EventKind, LedgerEvent};
use subnames::resolver::NATIVE_COIN_TYPE;
use subnames::utils::full_name;

use crate::envelope::LogPosition;
use crate::error::ApplyError;
use crate::model::{NameRow, NodeState, RegistrationRow};

/// Where an event came from, plus settings reducers need.
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext<'a> {
    pub position: LogPosition,
    pub tx_hash: &'a str,
    pub root_name: &'a str,
}

pub type Reducer = fn(NodeState, &LedgerEvent, &ApplyContext<'_>) -> Result<NodeState, ApplyError>;

pub static DISPATCH: [(EventKind, Reducer); 9] = [
    (EventKind::NameCreated, name_created),
    (EventKind::ExpiryUpdated, expiry_updated),
    (EventKind::NameRevoked, name_revoked),
    (EventKind::Transferred, transferred),
    (EventKind::TextChanged, text_changed),
    (EventKind::AddrChanged, addr_changed),
    (EventKind::AddressChanged, address_changed),
    (EventKind::ContenthashChanged, contenthash_changed),
    (EventKind::NameRegistered, name_registered),
];

pub fn reducer_for(kind: EventKind) -> Option<Reducer> {
    DISPATCH
        .iter()
        .find(|(entry, _)| *entry == kind)
        .map(|(_, reducer)| *reducer)
}

fn unknown_node(state: &NodeState, event: &LedgerEvent) -> ApplyError {
    ApplyError::UnknownNode {
        kind: event.kind(),
        node: state.node.clone(),
    }
}

fn name_created(
    mut state: NodeState,
    event: &LedgerEvent,
    ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    let LedgerEvent::NameCreated {
        label,
        owner,
        expiry,
        ..
    } = event
    else {
        return Ok(state);
    };

    state.record_mut();
    state.name = Some(NameRow {
        label: label.clone(),
        full_name: full_name(label, ctx.root_name),
        owner: Some(owner.to_string()),
        expiry: *expiry,
        creation_block: ctx.position.block_height,
        creation_tx: ctx.tx_hash.to_string(),
    });

    // A controller may have reported the sale first within the same transaction
    let (price, payment_token) = match state.registration.take() {
        Some(previous) if previous.tx_hash == ctx.tx_hash => {
            (previous.price, previous.payment_token)
        }
        _ => (None, None),
    };
    state.registration = Some(RegistrationRow {
        label: label.clone(),
        owner: Some(owner.to_string()),
        tx_hash: ctx.tx_hash.to_string(),
        block_height: ctx.position.block_height,
        price,
        payment_token,
    });
    Ok(state)
}

fn expiry_updated(
    mut state: NodeState,
    event: &LedgerEvent,
    _ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    let LedgerEvent::ExpiryUpdated { expiry, .. } = event else {
        return Ok(state);
    };
    let missing = unknown_node(&state, event);
    let name = state.name.as_mut().ok_or(missing)?;
    name.expiry = *expiry;
    Ok(state)
}

/// Soft delete: the row stays so the node keeps resolving its label.
fn name_revoked(
    mut state: NodeState,
    event: &LedgerEvent,
    _ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    let missing = unknown_node(&state, event);
    let name = state.name.as_mut().ok_or(missing)?;
    name.owner = None;
    name.expiry = 0;
    Ok(state)
}

fn transferred(
    mut state: NodeState,
    event: &LedgerEvent,
    _ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    let LedgerEvent::Transferred { to, .. } = event else {
        return Ok(state);
    };
    let missing = unknown_node(&state, event);
    let name = state.name.as_mut().ok_or(missing)?;
    name.owner = Some(to.to_string());
    Ok(state)
}

fn text_changed(
    mut state: NodeState,
    event: &LedgerEvent,
    _ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    if let LedgerEvent::TextChanged { key, value, .. } = event {
        state.record_mut().set_text(key, value);
    }
    Ok(state)
}

fn addr_changed(
    mut state: NodeState,
    event: &LedgerEvent,
    _ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    if let LedgerEvent::AddrChanged { address, .. } = event {
        state
            .record_mut()
            .set_address(NATIVE_COIN_TYPE, address.clone());
    }
    Ok(state)
}

fn address_changed(
    mut state: NodeState,
    event: &LedgerEvent,
    _ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    if let LedgerEvent::AddressChanged {
        coin_type, address, ..
    } = event
    {
        state.record_mut().set_address(*coin_type, address.clone());
    }
    Ok(state)
}

fn contenthash_changed(
    mut state: NodeState,
    event: &LedgerEvent,
    _ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    if let LedgerEvent::ContenthashChanged { hash, .. } = event {
        state.record_mut().contenthash = hash.clone();
    }
    Ok(state)
}

fn name_registered(
    mut state: NodeState,
    event: &LedgerEvent,
    ctx: &ApplyContext<'_>,
) -> Result<NodeState, ApplyError> {
    let LedgerEvent::NameRegistered {
        price,
        payment_token,
        ..
    } = event
    else {
        return Ok(state);
    };

    let label = state
        .name
        .as_ref()
        .map(|name| name.label.clone())
        .unwrap_or_default();
    let registration = state.registration.get_or_insert_with(RegistrationRow::default);
    if registration.tx_hash != ctx.tx_hash {
        *registration = RegistrationRow {
            label,
            owner: None,
            tx_hash: ctx.tx_hash.to_string(),
            block_height: ctx.position.block_height,
            price: None,
            payment_token: None,
        };
    }
    registration.price = Some(*price);
    registration.payment_token = Some(payment_token.clone());
    Ok(state)
}
