//! Locking script to address derivation.

use crate::{Error, Result};
use bitcoin::opcodes::all::{OP_CHECKMULTISIG, OP_PUSHNUM_1, OP_PUSHNUM_16};
use bitcoin::script::Instruction;
use bitcoin::{Address, Network, Opcode, PublicKey, Script};

/// Derives the addresses a locking script pays to.
pub trait AddressResolver: Send + Sync {
    /// Returns zero or more candidate addresses for `script`.
    ///
    /// Fails with [`Error::UnrecognizedScriptType`] if the script form is unknown.
    fn addresses(&self, script: &Script) -> Result<Vec<Address>>;
}

/// Address derivation for the standard script templates of one network.
///
/// - P2PKH, P2SH, segwit v0 and taproot outputs map to their own address.
/// - P2PK maps to the P2PKH address of the key.
/// - Bare multisig maps to the P2PKH address of every valid key, invalid keys
///   (common in data-carrying multisig outputs) are left out.
/// - `OP_RETURN` outputs have no address.
#[derive(Debug, Clone, Copy)]
pub struct StandardAddressResolver {
    network: Network,
}

impl StandardAddressResolver {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    fn p2pkh(&self, pubkey: &PublicKey) -> Address {
        Address::p2pkh(pubkey.pubkey_hash(), self.network)
    }
}

impl AddressResolver for StandardAddressResolver {
    fn addresses(&self, script: &Script) -> Result<Vec<Address>> {
        if script.is_op_return() {
            return Ok(Vec::new());
        }

        if let Some(pubkey) = script.p2pk_public_key() {
            return Ok(vec![self.p2pkh(&pubkey)]);
        }

        if let Some(keys) = match_multisig(script) {
            return Ok(keys
                .iter()
                .filter_map(|key| PublicKey::from_slice(key).ok())
                .map(|pubkey| self.p2pkh(&pubkey))
                .collect());
        }

        Address::from_script(script, self.network)
            .map(|address| vec![address])
            .map_err(|_| Error::UnrecognizedScriptType(script.to_owned()))
    }
}

/// Returns the key pushes of a bare multisig script of the form
/// `m <pubkey>... n OP_CHECKMULTISIG`.
fn match_multisig(script: &Script) -> Option<Vec<&[u8]>> {
    let mut instructions = script.instructions();

    let required_sigs = match instructions.next()? {
        Ok(Instruction::Op(op)) => decode_pushnum(op)?,
        _ => return None,
    };

    let mut keys = Vec::new();
    let keys_count = loop {
        match instructions.next()? {
            Ok(Instruction::PushBytes(key)) => keys.push(key.as_bytes()),
            Ok(Instruction::Op(op)) => break decode_pushnum(op)?,
            Err(_) => return None,
        }
    };

    if keys_count as usize != keys.len() || required_sigs > keys_count {
        return None;
    }

    match instructions.next()? {
        Ok(Instruction::Op(op)) if op == OP_CHECKMULTISIG => {}
        _ => return None,
    }

    instructions.next().is_none().then_some(keys)
}

fn decode_pushnum(opcode: Opcode) -> Option<u8> {
    if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&opcode.to_u8()) {
        Some(opcode.to_u8() - 0x50)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::ScriptBuf;
    use bitcoin::hashes::Hash;
    use bitcoin::opcodes::all::OP_PUSHNUM_2;

    // Public key of the genesis block coinbase output.
    const GENESIS_PUBKEY: &str = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";

    fn genesis_pubkey() -> PublicKey {
        PublicKey::from_slice(&hex::decode(GENESIS_PUBKEY).unwrap()).unwrap()
    }

    #[test]
    fn test_p2pk_maps_to_p2pkh() {
        let resolver = StandardAddressResolver::new(Network::Bitcoin);
        let script = ScriptBuf::new_p2pk(&genesis_pubkey());

        let addresses = resolver.addresses(&script).unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(
            addresses[0].to_string(),
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"
        );
    }

    #[test]
    fn test_p2pkh_and_p2sh() {
        let resolver = StandardAddressResolver::new(Network::Bitcoin);
        let pubkey_hash = genesis_pubkey().pubkey_hash();

        let p2pkh = ScriptBuf::new_p2pkh(&pubkey_hash);
        assert_eq!(
            resolver.addresses(&p2pkh).unwrap()[0],
            Address::p2pkh(pubkey_hash, Network::Bitcoin)
        );

        let p2sh = ScriptBuf::new_p2sh(&bitcoin::ScriptHash::from_byte_array([3; 20]));
        assert_eq!(resolver.addresses(&p2sh).unwrap().len(), 1);
    }

    #[test]
    fn test_multisig_skips_invalid_keys() {
        let resolver = StandardAddressResolver::new(Network::Bitcoin);
        let script = bitcoin::script::Builder::new()
            .push_opcode(OP_PUSHNUM_1)
            .push_key(&genesis_pubkey())
            .push_slice([0x05u8; 33])
            .push_opcode(OP_PUSHNUM_2)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script();

        let addresses = resolver.addresses(&script).unwrap();
        assert_eq!(
            addresses,
            vec![Address::p2pkh(
                genesis_pubkey().pubkey_hash(),
                Network::Bitcoin
            )]
        );
    }

    #[test]
    fn test_op_return_has_no_address() {
        let resolver = StandardAddressResolver::new(Network::Bitcoin);
        let script = ScriptBuf::new_op_return([1u8, 2, 3]);
        assert!(resolver.addresses(&script).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_script_is_unrecognized() {
        let resolver = StandardAddressResolver::new(Network::Bitcoin);
        let script = ScriptBuf::from_bytes(vec![0x51, 0x52, 0x93]);
        assert!(matches!(
            resolver.addresses(&script),
            Err(Error::UnrecognizedScriptType(s)) if s == script
        ));
    }
}
