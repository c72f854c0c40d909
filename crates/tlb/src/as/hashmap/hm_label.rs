use crate::{
    Error,
    bits::{
        r#as::{NBits, Unary, VarNBits},
        bitvec::{order::Msb0, slice::BitSlice, vec::BitVec},
        de::{BitReader, BitReaderExt, r#as::BitUnpackAs},
        ser::{BitWriter, BitWriterExt, r#as::BitPackAs},
    },
};

/// `HmLabel ~n m` for [`Hashmap`](super::Hashmap)
/// ```tlb
/// hml_short$0 {m:#} {n:#} len:(Unary ~n) {n <= m} s:(n * Bit) = HmLabel ~n m;
/// hml_long$10 {m:#} n:(#<= m) s:(n * Bit) = HmLabel ~n m;
/// hml_same$11 {m:#} v:Bit n:(#<= m) = HmLabel ~n m;
/// ```
///
/// Packing emits the shortest form, preferring `hml_short`, then `hml_same`.
pub struct HmLabel;

/// Constructor of [`HmLabel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmLabelForm {
    Short,
    Long,
    Same(bool),
}

impl HmLabel {
    /// Width of `#<= m`
    #[inline]
    pub const fn len_bits(m: u32) -> u32 {
        u32::BITS - m.leading_zeros()
    }

    /// Shortest encoding of `label` under `m` with its length in bits
    pub fn choose(label: &BitSlice<u8, Msb0>, m: u32) -> (HmLabelForm, usize) {
        let n = label.len();
        let k = Self::len_bits(m) as usize;
        let mut best = (HmLabelForm::Short, 2 * n + 2);
        if label.all() || label.not_any() {
            let same = (HmLabelForm::Same(label.any()), 3 + k);
            if same.1 < best.1 {
                best = same;
            }
        }
        if 2 + k + n < best.1 {
            best = (HmLabelForm::Long, 2 + k + n);
        }
        best
    }
}

impl BitPackAs<BitSlice<u8, Msb0>> for HmLabel {
    /// m
    type Args = u32;

    fn pack_as<W>(source: &BitSlice<u8, Msb0>, writer: &mut W, m: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        let n = source.len() as u32;
        // {n <= m}
        if n > m {
            return Err(Error::custom(format!("label of {n} bits exceeds {m}")));
        }
        let k = Self::len_bits(m);
        match Self::choose(source, m).0 {
            HmLabelForm::Short => {
                writer
                    // hml_short$0
                    .pack(false, ())?
                    // len:(Unary ~n)
                    .pack_as::<_, Unary>(n, ())?
                    // s:(n * Bit)
                    .pack(source, ())?;
            }
            HmLabelForm::Long => {
                writer
                    // hml_long$10
                    .pack_as::<_, NBits<2>>(0b10u8, ())?
                    // n:(#<= m)
                    .pack_as::<_, VarNBits>(n, k)?
                    // s:(n * Bit)
                    .pack(source, ())?;
            }
            HmLabelForm::Same(v) => {
                writer
                    // hml_same$11
                    .pack_as::<_, NBits<2>>(0b11u8, ())?
                    // v:Bit
                    .pack(v, ())?
                    // n:(#<= m)
                    .pack_as::<_, VarNBits>(n, k)?;
            }
        }
        Ok(())
    }
}

impl BitPackAs<BitVec<u8, Msb0>> for HmLabel {
    /// m
    type Args = u32;

    #[inline]
    fn pack_as<W>(source: &BitVec<u8, Msb0>, writer: &mut W, m: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        <Self as BitPackAs<BitSlice<u8, Msb0>>>::pack_as(source.as_bitslice(), writer, m)
    }
}

impl<'de> BitUnpackAs<'de, BitVec<u8, Msb0>> for HmLabel {
    /// m
    type Args = u32;

    fn unpack_as<R>(reader: &mut R, m: Self::Args) -> Result<BitVec<u8, Msb0>, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let k = Self::len_bits(m);
        let label = match reader.unpack::<bool>(())? {
            // hml_short$0
            false => {
                // len:(Unary ~n)
                let n: u32 = reader.unpack_as::<_, Unary>(())?;
                // {n <= m}
                if n > m {
                    return Err(Error::custom(format!("n = {n} > m = {m}")));
                }
                // s:(n * Bit)
                reader.unpack(n as usize)?
            }
            true => match reader.unpack::<bool>(())? {
                // hml_long$10
                false => {
                    // n:(#<= m)
                    let n: u32 = reader.unpack_as::<_, VarNBits>(k)?;
                    if n > m {
                        return Err(Error::custom(format!("n = {n} > m = {m}")));
                    }
                    // s:(n * Bit)
                    reader.unpack(n as usize)?
                }
                // hml_same$11
                true => {
                    // v:Bit
                    let v: bool = reader.unpack(())?;
                    // n:(#<= m)
                    let n: u32 = reader.unpack_as::<_, VarNBits>(k)?;
                    if n > m {
                        return Err(Error::custom(format!("n = {n} > m = {m}")));
                    }
                    BitVec::repeat(v, n as usize)
                }
            },
        };
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use bitvec::bits;
    use rstest::rstest;

    use crate::bits::{
        de::r#as::unpack_fully_as,
        ser::r#as::pack_as,
    };

    use super::*;

    #[rstest]
    #[case(bits![u8, Msb0;], 8, HmLabelForm::Short)]
    #[case(bits![u8, Msb0; 1, 0, 1], 8, HmLabelForm::Short)]
    #[case(bits![u8, Msb0; 1, 1, 1, 1, 1, 1, 1, 1], 8, HmLabelForm::Same(true))]
    #[case(bits![u8, Msb0; 0, 0, 0, 0, 0, 0, 0], 8, HmLabelForm::Same(false))]
    #[case(bits![u8, Msb0; 1, 0, 1, 1, 0, 0, 1, 0], 8, HmLabelForm::Long)]
    fn shortest_form(
        #[case] label: &BitSlice<u8, Msb0>,
        #[case] m: u32,
        #[case] form: HmLabelForm,
    ) {
        let (chosen, len) = HmLabel::choose(label, m);
        assert_eq!(chosen, form);
        let packed = pack_as::<_, &HmLabel>(label, m).unwrap();
        assert_eq!(packed.len(), len);
        let got: BitVec<u8, Msb0> = unpack_fully_as::<_, HmLabel>(&packed, m).unwrap();
        assert_eq!(got, label);
    }

    #[test]
    fn tie_prefers_short() {
        // short: 2 * 1 + 2 = 4, same: 3 + 1 = 4
        assert_eq!(
            HmLabel::choose(bits![u8, Msb0; 1], 1),
            (HmLabelForm::Short, 4)
        );
    }

    #[test]
    fn accepts_long_and_same() {
        // hml_long$10 n=2 in 4 bits (m = 8) s=01
        let long = bits![u8, Msb0; 1, 0, 0, 0, 1, 0, 0, 1];
        let got: BitVec<u8, Msb0> = unpack_fully_as::<_, HmLabel>(long, 8).unwrap();
        assert_eq!(got, bits![u8, Msb0; 0, 1]);

        // hml_same$11 v=1 n=3 in 4 bits
        let same = bits![u8, Msb0; 1, 1, 1, 0, 0, 1, 1];
        let got: BitVec<u8, Msb0> = unpack_fully_as::<_, HmLabel>(same, 8).unwrap();
        assert_eq!(got, bits![u8, Msb0; 1, 1, 1]);
    }

    #[test]
    fn rejects_label_longer_than_m() {
        // hml_same$11 v=0 n=9 in 4 bits
        let same = bits![u8, Msb0; 1, 1, 0, 1, 0, 0, 1];
        assert!(unpack_fully_as::<BitVec<u8, Msb0>, HmLabel>(same, 8).is_err());
        assert!(pack_as::<_, &HmLabel>(bits![u8, Msb0; 0; 9], 8).is_err());
    }
}
