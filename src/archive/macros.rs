//! Macro untuk composite dan enumeration
//!
//! Urutan member di macro adalah urutan di wire. Encode dan decode dibangkitkan
//! dari daftar yang sama, jadi keduanya tidak mungkin berbeda urutan.

/// Implementasi `Encode` + `Decode` untuk struct dengan member berurutan.
///
/// ```
/// use hermes_archive::{archive_fields, from_slice, to_vec};
///
/// #[derive(Debug, PartialEq)]
/// struct Quote {
///     symbol: String,
///     bid: u64,
///     ask: u64,
/// }
///
/// archive_fields!(Quote { symbol, bid, ask });
///
/// let quote = Quote { symbol: "ETH".into(), bid: 10, ask: 11 };
/// let bytes = to_vec(&quote).unwrap();
/// assert_eq!(from_slice::<Quote>(&bytes).unwrap(), quote);
/// ```
#[macro_export]
macro_rules! archive_fields {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::Encode for $ty {
            fn encode<B: $crate::Buffer + ?Sized>(
                &self,
                archive: &mut $crate::Archive<'_, B>,
            ) -> ::core::result::Result<(), $crate::ArchiveError> {
                $( $crate::Encode::encode(&self.$field, archive)?; )+
                ::core::result::Result::Ok(())
            }
        }

        impl $crate::Decode for $ty {
            fn decode<B: $crate::Buffer + ?Sized>(
                archive: &mut $crate::Archive<'_, B>,
            ) -> ::core::result::Result<Self, $crate::ArchiveError> {
                // Field initializer dievaluasi sesuai urutan penulisan
                ::core::result::Result::Ok(Self {
                    $( $field: $crate::Decode::decode(archive)?, )+
                })
            }
        }
    };
}

/// Implementasi `Encode` + `Decode` untuk enum field-less lewat integer repr-nya.
///
/// Enum harus `Copy`. Nilai wire yang tidak cocok dengan variant mana pun
/// menghasilkan `ArchiveError::InvalidDiscriminant`.
///
/// ```
/// use hermes_archive::{archive_enum, from_slice, to_vec};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// #[repr(u16)]
/// enum Side {
///     Buy = 1,
///     Sell = 2,
/// }
///
/// archive_enum!(Side as u16 { Buy, Sell });
///
/// assert_eq!(to_vec(&Side::Sell).unwrap(), [0x02, 0x00]);
/// assert_eq!(from_slice::<Side>(&[0x01, 0x00]).unwrap(), Side::Buy);
/// assert!(from_slice::<Side>(&[0x03, 0x00]).is_err());
/// ```
#[macro_export]
macro_rules! archive_enum {
    ($ty:ident as $repr:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::Encode for $ty {
            fn encode<B: $crate::Buffer + ?Sized>(
                &self,
                archive: &mut $crate::Archive<'_, B>,
            ) -> ::core::result::Result<(), $crate::ArchiveError> {
                $crate::Encode::encode(&(*self as $repr), archive)
            }
        }

        impl $crate::Decode for $ty {
            fn decode<B: $crate::Buffer + ?Sized>(
                archive: &mut $crate::Archive<'_, B>,
            ) -> ::core::result::Result<Self, $crate::ArchiveError> {
                let raw = <$repr as $crate::Decode>::decode(archive)?;
                $(
                    if raw == $ty::$variant as $repr {
                        return ::core::result::Result::Ok($ty::$variant);
                    }
                )+
                ::core::result::Result::Err($crate::ArchiveError::InvalidDiscriminant {
                    type_name: ::core::stringify!($ty),
                    value: raw as i128,
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::VecBuffer;
    use crate::{Archive, ArchiveError};

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    crate::archive_fields!(Point { x, y, label });

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(i8)]
    enum Direction {
        Left = -1,
        Stay = 0,
        Right = 1,
    }

    crate::archive_enum!(Direction as i8 { Left, Stay, Right });

    #[derive(Debug, Clone, PartialEq)]
    struct Step {
        point: Point,
        direction: Direction,
        history: Vec<Direction>,
    }

    crate::archive_fields!(Step {
        point,
        direction,
        history,
    });

    #[test]
    fn test_fields_in_declared_order() {
        let point = Point {
            x: 1,
            y: -1,
            label: "p".to_string(),
        };

        let mut buffer = VecBuffer::new();
        Archive::new(&mut buffer).encode(&point).unwrap();

        assert_eq!(
            buffer.as_slice(),
            &[1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, b'p']
        );

        let decoded: Point = Archive::new(&mut buffer).decode().unwrap();
        assert_eq!(decoded, point);
    }

    #[test]
    fn test_enum_uses_repr() {
        let mut buffer = VecBuffer::new();
        Archive::new(&mut buffer)
            .encode(&Direction::Left)
            .unwrap()
            .encode(&Direction::Right)
            .unwrap();

        assert_eq!(buffer.as_slice(), &[0xFF, 0x01]);

        let mut archive = Archive::new(&mut buffer);
        assert_eq!(archive.decode::<Direction>().unwrap(), Direction::Left);
        assert_eq!(archive.decode::<Direction>().unwrap(), Direction::Right);
    }

    #[test]
    fn test_enum_invalid_discriminant() {
        let mut buffer = VecBuffer::from_bytes(&[0x05]);
        let err = Archive::new(&mut buffer)
            .decode::<Direction>()
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::InvalidDiscriminant {
                type_name: "Direction",
                value: 5
            }
        ));
    }

    #[test]
    fn test_nested_composite_roundtrip() {
        let step = Step {
            point: Point {
                x: 3,
                y: 4,
                label: "start".to_string(),
            },
            direction: Direction::Stay,
            history: vec![Direction::Left, Direction::Right, Direction::Right],
        };

        let mut buffer = VecBuffer::new();
        Archive::new(&mut buffer).encode(&step).unwrap();

        let decoded: Step = Archive::new(&mut buffer).decode().unwrap();
        assert_eq!(decoded, step);
        assert!(buffer.is_empty());
    }
}
