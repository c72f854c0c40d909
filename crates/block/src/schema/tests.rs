use std::sync::Arc;

use num_bigint::{BigInt, BigUint};
use rstest::rstest;
use tlb::{
    Cell,
    bits::{
        bitvec::{bits, order::Msb0},
        ser::BitWriterExt,
    },
    ser::{CellBuilder, CellSerializeExt},
};

use crate::{
    MsgAddress as Addr,
    currency::CurrencyCollection as Currencies,
    message::{
        CommonMsgInfo as Info, IntermediateAddress as Interm, InternalMsgInfo,
        Message as Msg, MsgEnvelope as Envelope,
    },
};

use super::*;

fn cell_with(f: impl FnOnce(&mut CellBuilder) -> Option<()>) -> Cell {
    let mut b = Cell::builder();
    f(&mut b).unwrap();
    b.into_cell()
}

fn bits_cell(bits: &tlb::bits::bitvec::slice::BitSlice<u8, Msb0>) -> Cell {
    let mut b = Cell::builder();
    b.pack(bits, ()).unwrap();
    b.into_cell()
}

fn envelope_cell(grams: u32, ihr_fee: u32, fwd_fee_remaining: u32) -> Arc<Cell> {
    let env = Envelope {
        cur_addr: Interm::Regular { use_dest_bits: 0 },
        next_addr: Interm::Regular { use_dest_bits: 96 },
        fwd_fee_remaining: fwd_fee_remaining.into(),
        msg: Msg {
            info: Info::Internal(InternalMsgInfo {
                ihr_disabled: false,
                bounce: true,
                bounced: false,
                src: Addr {
                    workchain_id: 0,
                    address: [0x11; 32],
                },
                dst: Addr {
                    workchain_id: -1,
                    address: [0x22; 32],
                },
                value: Currencies::grams(grams),
                ihr_fee: ihr_fee.into(),
                fwd_fee: BigUint::from(1u32),
                created_lt: 77,
                created_at: 1_700_000_000,
            }),
            init: None,
            body: Cell::default(),
        },
    };
    Arc::new(env.to_cell(()).unwrap())
}

#[test]
fn std_address() {
    let addr = Addr {
        workchain_id: -1,
        address: [0xab; 32],
    };
    let cell = cell_with(|b| b.pack(addr, ()).ok().map(|_| ()));
    let cs = cell.parser();

    assert!(MsgAddressInt.validate_cell(&cell, false));
    assert_eq!(MsgAddressInt.get_tag(&cs), Some(MsgAddressInt::ADDR_STD));
    assert_eq!(
        MsgAddressInt.extract_std_address(&cs, true),
        Some((-1, [0xab; 32]))
    );
    assert_eq!(
        MsgAddressInt.get_prefix(&cs),
        Some((-1, 0xabab_abab_abab_abab))
    );
    assert_eq!(
        MsgAddressInt.print_cell(&cell).as_deref(),
        Ok(format!("-1:{}", "ab".repeat(32)).as_str())
    );
}

#[test]
fn zero_std_address() {
    let cell = cell_with(|b| {
        store_uint(b, 0b100, 3)?;
        store_uint(b, 0, 8)?;
        store_zeros(b, 256)
    });
    let cs = cell.parser();

    assert!(MsgAddressInt.validate_cell(&cell, false));
    assert_eq!(MsgAddressInt.get_prefix(&cs), Some((0, 0)));
    assert_eq!(
        MsgAddressInt.extract_std_address(&cs, true),
        Some((0, [0; 32]))
    );
}

#[test]
fn anycast_rewrite() {
    // addr_std$10 just$1 depth:4 rewrite_pfx:1010 workchain_id:0 address:0
    let cell = cell_with(|b| {
        store_uint(b, 0b101, 3)?;
        store_uint(b, 4, 5)?;
        store_uint(b, 0b1010, 4)?;
        store_uint(b, 0, 8)?;
        store_zeros(b, 256)
    });
    let cs = cell.parser();
    assert!(MsgAddressInt.validate_cell(&cell, false));

    let mut rewritten = [0; 32];
    rewritten[0] = 0xa0;
    assert_eq!(
        MsgAddressInt.extract_std_address(&cs, true),
        Some((0, rewritten))
    );
    assert_eq!(
        MsgAddressInt.extract_std_address(&cs, false),
        Some((0, [0; 32]))
    );
    assert_eq!(
        MsgAddressInt.get_prefix(&cs),
        Some((0, 0xa000_0000_0000_0000))
    );
    assert_eq!(MsgAddressInt.skip_get_depth(&mut cell.parser()), Some(4));
}

#[test]
fn empty_anycast_rejected() {
    // addr_std$10 just$1 depth:0 workchain_id:0 address:0
    let cell = cell_with(|b| {
        store_uint(b, 0b101, 3)?;
        store_uint(b, 0, 5 + 8)?;
        store_zeros(b, 256)
    });
    assert!(!MsgAddressInt.validate_cell(&cell, false));
}

#[rstest]
#[case::reserved(i32::MIN, false, None)]
#[case::wide(1000, true, Some((1000, 0)))]
#[case::expressible_as_std(0, false, Some((0, 0)))]
fn var_address_workchain(
    #[case] workchain: i32,
    #[case] valid: bool,
    #[case] prefix: Option<(i32, u64)>,
) {
    // addr_var$11 nothing$0 addr_len:256 workchain_id:int32 address:0
    let cell = cell_with(|b| {
        store_uint(b, 0b110, 3)?;
        store_uint(b, 256, 9)?;
        store_uint(b, u64::from(workchain as u32), 32)?;
        store_zeros(b, 256)
    });
    let cs = cell.parser();

    assert_eq!(MsgAddressInt.validate_cell(&cell, false), valid);
    assert_eq!(MsgAddressInt.get_prefix(&cs), prefix);
    assert_eq!(
        MsgAddressInt.extract_std_address(&cs, false),
        prefix.map(|(wc, _)| (wc, [0; 32]))
    );
}

#[test]
fn reserved_workchain_with_anycast_rejected() {
    // addr_var$11 just$1 depth:1 rewrite_pfx:1 addr_len:256 workchain_id:i32::MIN
    let cell = cell_with(|b| {
        store_uint(b, 0b111, 3)?;
        store_uint(b, 1, 5)?;
        store_uint(b, 1, 1)?;
        store_uint(b, 256, 9)?;
        store_uint(b, 0x8000_0000, 32)?;
        store_zeros(b, 256)
    });
    let cs = cell.parser();

    assert!(!MsgAddressInt.validate_cell(&cell, false));
    assert_eq!(MsgAddressInt.get_prefix(&cs), None);
    assert_eq!(MsgAddressInt.extract_std_address(&cs, true), None);
}

#[test]
fn address_none_is_not_internal() {
    let cell = bits_cell(bits![u8, Msb0; 0, 0]);
    assert!(MsgAddressExt.validate_cell(&cell, false));
    assert!(MsgAddress.validate_cell(&cell, false));
    assert!(!MsgAddressInt.validate_cell(&cell, false));
}

#[rstest]
#[case(bits![u8, Msb0; 0, 0], Some(CommonMsgInfo::INT_MSG_INFO))]
#[case(bits![u8, Msb0; 0, 1], Some(CommonMsgInfo::INT_MSG_INFO))]
#[case(bits![u8, Msb0; 1, 0], Some(CommonMsgInfo::EXT_IN_MSG_INFO))]
#[case(bits![u8, Msb0; 1, 1], Some(CommonMsgInfo::EXT_OUT_MSG_INFO))]
#[case(bits![u8, Msb0; 1], None)]
fn common_msg_info_tag(
    #[case] bits: &tlb::bits::bitvec::slice::BitSlice<u8, Msb0>,
    #[case] tag: Option<u32>,
) {
    assert_eq!(CommonMsgInfo.get_tag(&bits_cell(bits).parser()), tag);
}

#[rstest]
#[case(bits![u8, Msb0; 0, 0, 0], Some(InMsg::MSG_IMPORT_EXT))]
#[case(bits![u8, Msb0; 0, 0, 1], None)]
#[case(bits![u8, Msb0; 1, 1, 0], Some(InMsg::MSG_DISCARD_FIN))]
#[case(bits![u8, Msb0; 1, 1, 1], Some(InMsg::MSG_DISCARD_TR))]
fn in_msg_tag(
    #[case] bits: &tlb::bits::bitvec::slice::BitSlice<u8, Msb0>,
    #[case] tag: Option<u32>,
) {
    assert_eq!(InMsg.get_tag(&bits_cell(bits).parser()), tag);
}

#[rstest]
#[case(bits![u8, Msb0; 0, 0, 1], Some(OutMsg::MSG_EXPORT_NEW))]
#[case(bits![u8, Msb0; 1, 0, 0], Some(OutMsg::MSG_EXPORT_DEQ_IMM))]
#[case(bits![u8, Msb0; 1, 0, 1], None)]
#[case(bits![u8, Msb0; 1, 1, 0], Some(OutMsg::MSG_EXPORT_DEQ))]
fn out_msg_tag(
    #[case] bits: &tlb::bits::bitvec::slice::BitSlice<u8, Msb0>,
    #[case] tag: Option<u32>,
) {
    assert_eq!(OutMsg.get_tag(&bits_cell(bits).parser()), tag);
}

#[test]
fn envelope_value() {
    let env = envelope_cell(1_000, 2, 3);
    let cs = env.parser();

    assert!(MsgEnvelope.validate_cell(&env, false));
    assert_eq!(MsgEnvelope.get_created_lt(&cs), Some(77));

    let (fwd_fee_remaining, value) = MsgEnvelope.unpack_value(&cs).unwrap();
    assert_eq!(fwd_fee_remaining, BigInt::from(3));
    assert_eq!(value.ihr_fee, BigInt::from(2));
    assert_eq!(value.fwd_fee, BigInt::from(1));
    assert_eq!(
        CurrencyCollection.as_integer(&value.value),
        Some(BigInt::from(1_000))
    );
}

#[test]
fn import_fees_of_external() {
    // msg_import_ext$000 with placeholder references
    let cell = cell_with(|b| {
        store_uint(b, 0, 3)?;
        b.store_reference(Arc::new(Cell::default())).ok()?;
        b.store_reference(Arc::new(Cell::default())).ok()?;
        Some(())
    });
    let mut cs = cell.parser();
    let mut fees = Cell::builder();
    InMsg.get_import_fees(&mut fees, &mut cs).unwrap();

    assert!(cs.is_empty());
    assert_eq!(fees.into_cell(), ImportFees.null_cell().unwrap());
}

#[test]
fn import_fees_of_discarded() {
    // msg_discard_fin$110 in_msg transaction_id:42 fwd_fee:9
    let cell = cell_with(|b| {
        store_uint(b, InMsg::MSG_DISCARD_FIN.into(), 3)?;
        b.store_reference(envelope_cell(10, 0, 9)).ok()?;
        store_uint(b, 42, 64)?;
        Grams.store_integer_value(b, &9.into())
    });
    assert!(InMsg.validate_cell(&cell, false));

    let mut fees = Cell::builder();
    InMsg.get_import_fees(&mut fees, &mut cell.parser()).unwrap();
    let expected = cell_with(|b| {
        Grams.store_integer_value(b, &9.into())?;
        CurrencyCollection.store_grams(b, &9.into())
    });
    assert_eq!(fees.into_cell(), expected);
}

#[test]
fn import_fees_of_final() {
    // msg_import_fin$100 in_msg transaction fwd_fee:3
    let cell = cell_with(|b| {
        store_uint(b, InMsg::MSG_IMPORT_FIN.into(), 3)?;
        b.store_reference(envelope_cell(1_000, 2, 3)).ok()?;
        b.store_reference(Arc::new(Cell::default())).ok()?;
        Grams.store_integer_value(b, &3.into())
    });
    let mut fees = Cell::builder();
    InMsg.get_import_fees(&mut fees, &mut cell.parser()).unwrap();
    let expected = cell_with(|b| {
        Grams.store_integer_value(b, &3.into())?;
        CurrencyCollection.store_grams(b, &1_005.into())
    });
    assert_eq!(fees.into_cell(), expected);

    // fwd_fee must match the envelope
    let mismatch = cell_with(|b| {
        store_uint(b, InMsg::MSG_IMPORT_FIN.into(), 3)?;
        b.store_reference(envelope_cell(1_000, 2, 3)).ok()?;
        b.store_reference(Arc::new(Cell::default())).ok()?;
        Grams.store_integer_value(b, &4.into())
    });
    assert!(
        InMsg
            .get_import_fees(&mut Cell::builder(), &mut mismatch.parser())
            .is_none()
    );
}

#[test]
fn export_value() {
    // msg_export_new$001 out_msg transaction
    let new = cell_with(|b| {
        store_uint(b, OutMsg::MSG_EXPORT_NEW.into(), 3)?;
        b.store_reference(envelope_cell(500, 1, 4)).ok()?;
        b.store_reference(Arc::new(Cell::default())).ok()?;
        Some(())
    });
    let mut value = Cell::builder();
    OutMsg.get_export_value(&mut value, &mut new.parser()).unwrap();
    assert_eq!(
        value.into_cell(),
        CurrencyCollection.integer_cell(&505.into()).unwrap()
    );
    assert_eq!(OutMsg.get_created_lt(&new.parser()), Some(77));

    // msg_export_deq$110 out_msg import_block_lt:0
    let deq = cell_with(|b| {
        store_uint(b, OutMsg::MSG_EXPORT_DEQ.into(), 3)?;
        b.store_reference(envelope_cell(500, 1, 4)).ok()?;
        store_zeros(b, 64)
    });
    assert!(OutMsg.validate_cell(&deq, false));
    let mut value = Cell::builder();
    OutMsg.get_export_value(&mut value, &mut deq.parser()).unwrap();
    assert_eq!(value.into_cell(), CurrencyCollection.null_cell().unwrap());
}

#[rstest]
#[case(InMsg::MSG_IMPORT_TR)]
#[case(InMsg::MSG_DISCARD_TR)]
fn truncated_in_msg(#[case] tag: u32) {
    let cell = cell_with(|b| store_uint(b, tag.into(), 3));
    assert!(!InMsg.validate_cell(&cell, false));
    assert!(InMsg.skip(&mut cell.parser()).is_none());
}

#[rstest]
#[case(TransactionDescr::TRANS_ORD, 0b0000, 4)]
#[case(TransactionDescr::TRANS_STORAGE, 0b0001, 4)]
#[case(TransactionDescr::TRANS_TICK_TOCK, 0b0010, 4)]
#[case(TransactionDescr::TRANS_TICK_TOCK, 0b0011, 4)]
#[case(TransactionDescr::TRANS_MERGE_INSTALL, 0b0111, 4)]
fn transaction_descr_tag(#[case] tag: u32, #[case] bits: u64, #[case] len: u32) {
    let cell = cell_with(|b| store_uint(b, bits, len));
    assert_eq!(TransactionDescr.get_tag(&cell.parser()), Some(tag));
}

/// Referenced part of a VM compute phase with `gas_used` stored as
/// `len:1 value:0x00`
fn non_minimal_gas_used() -> Cell {
    cell_with(|b| {
        // gas_used
        store_uint(b, 1, 3)?;
        store_uint(b, 0, 8)?;
        // gas_limit
        store_uint(b, 0, 3)?;
        // gas_credit
        store_uint(b, 0, 1)?;
        // mode exit_code
        store_zeros(b, 8 + 32)?;
        // exit_arg
        store_uint(b, 0, 1)?;
        // vm_steps vm_init_state_hash vm_final_state_hash
        store_zeros(b, 32 + 256 + 256)
    })
}

#[test]
fn compute_phase_skip_trusts_var_uint() {
    let cell = non_minimal_gas_used();
    let cs = cell.parser();

    assert_eq!(
        TrComputeInternal1.get_size(&cs),
        Some(SizeExt::bits_only(3 + 8 + 3 + 1 + 40 + 1 + 32 + 512))
    );
    let mut tail = cell.parser();
    assert_eq!(TrComputeInternal1.skip(&mut tail), Some(()));
    assert!(tail.is_empty());

    assert!(!TrComputeInternal1.validate_cell(&cell, false));
}

#[test]
fn compute_phase_minimal_gas_used() {
    let cell = cell_with(|b| {
        store_uint(b, 1, 3)?;
        store_uint(b, 0x2a, 8)?;
        store_zeros(b, 3 + 1 + 40 + 1 + 32 + 512)
    });
    assert!(TrComputeInternal1.validate_cell(&cell, false));
    assert_eq!(
        TrComputeInternal1.get_size(&cell.parser()),
        Some(SizeExt::bits_only(3 + 8 + 3 + 1 + 40 + 1 + 32 + 512))
    );
}

#[test]
fn storage_fees() {
    // trans_storage$0001 storage_fees_collected:5 storage_fees_due:nothing
    // status_change:acst_unchanged
    let storage = cell_with(|b| {
        store_uint(b, 0b0001, 4)?;
        Grams.store_integer_value(b, &5.into())?;
        store_zeros(b, 2)
    });
    assert!(TransactionDescr.validate_cell(&storage, false));
    assert_eq!(
        TransactionDescr.get_storage_fees(&storage),
        Some(BigInt::from(5))
    );

    // trans_split_install$0101 has no storage phase
    let split_install = cell_with(|b| store_uint(b, 0b0101, 4));
    assert_eq!(
        TransactionDescr.get_storage_fees(&split_install),
        Some(BigInt::ZERO)
    );
}

#[test]
fn out_msg_queue_keeps_min_lt() {
    let left = cell_with(|b| store_uint(b, 10, 64));
    let right = cell_with(|b| store_uint(b, 7, 64));
    let mut sum = Cell::builder();
    AugOutMsgQueue
        .eval_fork(&mut sum, &mut left.parser(), &mut right.parser())
        .unwrap();
    assert_eq!(sum.into_cell(), right);

    let mut empty = Cell::builder();
    AugOutMsgQueue.eval_empty(&mut empty).unwrap();
    assert_eq!(empty.into_cell().data.len(), 64);
}

#[test]
fn empty_out_msg_queue() {
    // ahme_empty$0 extra:0
    let cell = cell_with(|b| store_zeros(b, 1 + 64));
    assert!(OutMsgQueue.validate_cell(&cell, false));

    let bad_extra = cell_with(|b| {
        store_zeros(b, 1)?;
        store_uint(b, 1, 64)
    });
    assert!(!OutMsgQueue.validate_cell(&bad_extra, false));
}

#[test]
fn key_max_lt_sum() {
    let x = cell_with(|b| {
        store_uint(b, 0, 1)?;
        store_uint(b, 5, 64)
    });
    let y = cell_with(|b| {
        store_uint(b, 1, 1)?;
        store_uint(b, 3, 64)
    });
    let mut sum = Cell::builder();
    KeyMaxLt
        .add_values(&mut sum, &mut x.parser(), &mut y.parser())
        .unwrap();
    let expected = cell_with(|b| {
        store_uint(b, 1, 1)?;
        store_uint(b, 5, 64)
    });
    assert_eq!(sum.into_cell(), expected);
}

#[test]
fn depth_balance_sum() {
    let x = cell_with(|b| {
        store_uint(b, 2, 5)?;
        CurrencyCollection.store_grams(b, &10.into())
    });
    let y = cell_with(|b| {
        store_uint(b, 5, 5)?;
        CurrencyCollection.store_grams(b, &1.into())
    });
    let mut sum = Cell::builder();
    DepthBalanceInfo
        .add_values(&mut sum, &mut x.parser(), &mut y.parser())
        .unwrap();
    let expected = cell_with(|b| {
        store_uint(b, 5, 5)?;
        CurrencyCollection.store_grams(b, &11.into())
    });
    assert_eq!(sum.into_cell(), expected);
}

#[test]
fn empty_shard_accounts() {
    let cell = cell_with(|b| {
        store_zeros(b, 1)?;
        DepthBalanceInfo.null_value(b)
    });
    assert!(ShardAccounts.validate_cell(&cell, false));

    let mut extra = cell.parser();
    ShardAccounts.inner().extract_extra(&mut extra).unwrap();
    assert_eq!(extra.bits_left(), 5 + 5);
}

#[rstest]
#[case(10, 3, Subtraction::NonZero, Some(7))]
#[case(3, 3, Subtraction::Zero, Some(0))]
#[case(3, 10, Subtraction::Invalid, None)]
fn currency_sub(
    #[case] x: u32,
    #[case] y: u32,
    #[case] outcome: Subtraction,
    #[case] diff: Option<u32>,
) {
    let x = CurrencyCollection.integer_cell(&x.into()).unwrap();
    let y = CurrencyCollection.integer_cell(&y.into()).unwrap();
    let mut cb = Cell::builder();
    assert_eq!(
        CurrencyCollection.sub_values(&mut cb, &mut x.parser(), &mut y.parser()),
        outcome
    );
    if let Some(diff) = diff {
        assert_eq!(
            CurrencyCollection.as_integer(&cb.into_cell().parser()),
            Some(diff.into())
        );
    }
}

#[test]
fn currency_add() {
    let x = CurrencyCollection.integer_cell(&40.into()).unwrap();
    let y = CurrencyCollection.integer_cell(&2.into()).unwrap();
    let mut cb = Cell::builder();
    CurrencyCollection
        .add_values(&mut cb, &mut x.parser(), &mut y.parser())
        .unwrap();
    assert_eq!(
        cb.into_cell(),
        CurrencyCollection.integer_cell(&42.into()).unwrap()
    );
}

#[test]
fn shard_ident() {
    let root = crate::ShardIdent::from_shard(0, 0x8000_0000_0000_0000).unwrap();
    let cell = cell_with(|b| b.pack(root, ()).ok().map(|_| ()));
    assert!(ShardIdent.validate_cell(&cell, false));
    assert_eq!(
        ShardIdent.get_shard(&cell.parser()),
        Some((0, 0x8000_0000_0000_0000))
    );
    assert_eq!(
        ShardIdent.print_cell(&cell).as_deref(),
        Ok("0:8000000000000000")
    );

    let left = crate::ShardIdent::from_shard(-1, 0x4000_0000_0000_0000).unwrap();
    let cell = cell_with(|b| b.pack(left, ()).ok().map(|_| ()));
    assert_eq!(
        ShardIdent.get_shard(&cell.parser()),
        Some((-1, 0x4000_0000_0000_0000))
    );
}

#[rstest]
// prefix longer than shard_pfx_bits
#[case(1, 0, 0x4000_0000_0000_0000)]
// shard_pfx_bits over 60
#[case(61, 0, 0)]
// reserved workchain
#[case(0, i32::MIN, 0)]
fn invalid_shard_ident(#[case] pfx_bits: u64, #[case] workchain: i32, #[case] prefix: u64) {
    let cell = cell_with(|b| {
        store_uint(b, 0, 2)?;
        store_uint(b, pfx_bits, 6)?;
        store_uint(b, workchain as u32 as u64, 32)?;
        store_uint(b, prefix, 64)
    });
    assert!(!ShardIdent.validate_cell(&cell, false));
    assert_eq!(ShardIdent.get_shard(&cell.parser()), None);
}

#[rstest]
#[case(false, 608)]
#[case(true, 1216)]
fn blk_prev_info_size(#[case] merged: bool, #[case] bits: usize) {
    let t = BlkPrevInfo::new(merged);
    let cell = cell_with(|b| store_zeros(b, bits));
    assert_eq!(t.get_size(&cell.parser()), Some(SizeExt::bits_only(bits)));
    assert!(t.validate_cell(&cell, false));
    assert!(!BlkPrevInfo::new(!merged).validate_cell(&cell, false));
}

#[test]
fn mc_state_extra_tag() {
    let cell = cell_with(|b| {
        store_uint(b, McStateExtra::TAG, 16)?;
        b.store_reference(Arc::new(Cell::default())).ok()?;
        store_uint(b, 0b101, 3)
    });
    assert!(McStateExtra.validate_cell(&cell, false));

    let cell = cell_with(|b| store_uint(b, 0xcc27, 16));
    assert!(!McStateExtra.validate_cell(&cell, false));
    assert_eq!(
        McStateExtra.get_size(&cell.parser()),
        Some(SizeExt::bits_only(16))
    );
}

#[test]
fn ops_budget() {
    let env = envelope_cell(1, 0, 0);
    assert!(MsgEnvelope.validate_upto(8, &env.parser(), false));
    assert!(!MsgEnvelope.validate_upto(0, &env.parser(), false));
}
