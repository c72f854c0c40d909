use crate::de::CellParser;

use super::{Ops, PrettyPrinter, SizeExt, TlbType};

/// ```tlb
/// nothing$0 {X:Type} = Maybe X;
/// just$1 {X:Type} value:X = Maybe X;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Maybe<T>(pub T);

impl<T> TlbType for Maybe<T>
where
    T: TlbType,
{
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => Some(()),
            _ => self.0.validate_skip(ops, cs, weak),
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => Some(()),
            _ => self.0.skip(cs),
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|b| b as u32)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => pp.out("nothing"),
            _ => {
                pp.open("just")?;
                pp.field("value")?;
                self.0.print_skip(pp, cs)?;
                pp.close()
            }
        }
    }
}

/// ```tlb
/// left$0 {X:Type} {Y:Type} value:X = Either X Y;
/// right$1 {X:Type} {Y:Type} value:Y = Either X Y;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Either<L, R>(pub L, pub R);

impl<L, R> TlbType for Either<L, R>
where
    L: TlbType,
    R: TlbType,
{
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => self.0.validate_skip(ops, cs, weak),
            _ => self.1.validate_skip(ops, cs, weak),
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => self.0.skip(cs),
            _ => self.1.skip(cs),
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|b| b as u32)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => {
                pp.open("left")?;
                pp.field("value")?;
                self.0.print_skip(pp, cs)?;
            }
            _ => {
                pp.open("right")?;
                pp.field("value")?;
                self.1.print_skip(pp, cs)?;
            }
        }
        pp.close()
    }
}

/// `^X`: a reference to a cell holding exactly one `X`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefTo<T>(pub T);

impl<T> TlbType for RefTo<T>
where
    T: TlbType,
{
    #[inline]
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        self.0.validate_skip_ref(ops, cs, weak)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance_refs(1)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::new(0, 1))
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let cell = cs.fetch_reference()?;
        pp.out("^")?;
        self.0.print_ref(pp, cell)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bitvec::{bits, order::Msb0};

    use crate::{
        Cell,
        bits::ser::{BitWriter, BitWriterExt},
        schema::{Bits, Ops, TlbTypeExt, UInt},
    };

    use super::*;

    #[test]
    fn maybe_either() {
        let mut b = Cell::builder();
        b.pack(bits![u8, Msb0; 1, 1, 0, 1, 0, 0, 0, 0, 0, 1, 1], ()).unwrap();
        let cell = b.into_cell();

        let t = Maybe(Either(UInt(4), UInt(8)));
        let cs = cell.parser();
        assert_eq!(t.get_tag(&cs), Some(1));
        assert_eq!(t.get_size(&cs), Some(SizeExt::bits_only(10)));
        assert_eq!(
            t.print_cell(&cell).unwrap_err(),
            "(just\n  value:(right\n    value:65))<FATAL: extra data in cell>",
        );
    }

    #[test]
    fn ref_to_validates_contents() {
        let inner = {
            let mut b = Cell::builder();
            b.pack(bits![u8, Msb0; 1, 0, 1], ()).unwrap();
            Arc::new(b.into_cell())
        };
        let mut b = Cell::builder();
        b.store_reference(inner).unwrap();
        let outer = b.into_cell();

        assert!(RefTo(Bits(3)).validate_cell(&outer, false));
        // contents must span the whole referenced cell
        assert!(!RefTo(Bits(2)).validate_cell(&outer, false));
        // skipping does not look inside
        assert_eq!(
            RefTo(Bits(2)).get_size(&outer.parser()),
            Some(SizeExt::new(0, 1))
        );
        assert!(RefTo(Bits(3)).validate_exact(&mut Ops::default(), &outer.parser(), false));
        assert_eq!(RefTo(Bits(3)).print_cell(&outer).unwrap(), "^x{A_}");
    }

    #[test]
    fn exotic_ref_needs_weak() {
        let mut b = Cell::builder();
        // library reference type byte, then a 256-bit hash
        b.pack(bits![u8, Msb0; 0, 0, 0, 0, 0, 0, 1, 0], ())
            .unwrap()
            .repeat_bit(256, false)
            .unwrap();
        let lib = Arc::new(b.into_exotic_cell().unwrap());
        let mut b = Cell::builder();
        b.store_reference(lib).unwrap();
        let outer = b.into_cell();

        assert!(!RefTo(Bits(3)).validate_cell(&outer, false));
        assert!(RefTo(Bits(3)).validate_cell(&outer, true));
    }

    #[test]
    fn budget_exhaustion() {
        let mut cell = Arc::new(Cell::new());
        for _ in 0..5 {
            let mut b = Cell::builder();
            b.store_reference(cell).unwrap();
            cell = Arc::new(b.into_cell());
        }
        // five nested references, each must hold a reference except the last
        struct Chain;
        impl TlbType for Chain {
            fn validate_skip(
                &self,
                ops: &mut Ops,
                cs: &mut CellParser<'_>,
                weak: bool,
            ) -> Option<()> {
                if cs.no_references_left() {
                    return Some(());
                }
                RefTo(Chain).validate_skip(ops, cs, weak)
            }
        }
        assert!(Chain.validate_upto(5, &cell.parser(), false));
        assert!(!Chain.validate_upto(4, &cell.parser(), false));
        assert!(Chain.validate_ref(&mut Ops::new(6), &cell, false));
        assert!(!Chain.validate_ref(&mut Ops::new(5), &cell, false));
    }
}
