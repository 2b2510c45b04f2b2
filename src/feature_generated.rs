//! `Feature` and `Geometry` tables of the FlatGeobuf schema (`feature.fbs`), in the shape
//! flatc generates. Only the fields read by this crate have accessors.

use flatbuffers::{
    Follow, ForwardsUOffset, InvalidFlatbuffer, Table, VOffsetT, Vector, Verifiable, Verifier,
    VerifierOptions,
};

#[derive(Copy, Clone, PartialEq)]
pub struct Geometry<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Geometry<'a> {
    type Inner = Geometry<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Geometry<'a> {
    pub const VT_XY: VOffsetT = 6;
    pub const VT_TYPE_: VOffsetT = 16;
    pub const VT_PARTS: VOffsetT = 18;

    #[inline]
    pub fn xy(&self) -> Option<Vector<'a, f64>> {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, f64>>>(Geometry::VT_XY, None)
        }
    }

    /// Geometry type tag, 0 (Unknown) unless the dataset mixes types.
    #[inline]
    pub fn type_(&self) -> u8 {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<u8>(Geometry::VT_TYPE_, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn parts(&self) -> Option<Vector<'a, ForwardsUOffset<Geometry<'a>>>> {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Geometry>>>>(
                    Geometry::VT_PARTS,
                    None,
                )
        }
    }
}

impl Verifiable for Geometry<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, f64>>>("xy", Self::VT_XY, false)?
            .visit_field::<u8>("type_", Self::VT_TYPE_, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Geometry>>>>(
                "parts",
                Self::VT_PARTS,
                false,
            )?
            .finish();
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq)]
pub struct Feature<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Feature<'a> {
    type Inner = Feature<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Feature<'a> {
    pub const VT_GEOMETRY: VOffsetT = 4;
    pub const VT_PROPERTIES: VOffsetT = 6;

    #[inline]
    pub fn geometry(&self) -> Option<Geometry<'a>> {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Geometry>>(Feature::VT_GEOMETRY, None)
        }
    }

    #[inline]
    pub fn properties(&self) -> Option<Vector<'a, u8>> {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, u8>>>(Feature::VT_PROPERTIES, None)
        }
    }
}

impl Verifiable for Feature<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Geometry>>("geometry", Self::VT_GEOMETRY, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, u8>>>(
                "properties",
                Self::VT_PROPERTIES,
                false,
            )?
            .finish();
        Ok(())
    }
}

/// Verifies a size prefixed `Feature` buffer and returns its root table.
#[inline]
pub fn size_prefixed_root_as_feature_with_opts<'b, 'o>(
    opts: &'o VerifierOptions,
    buf: &'b [u8],
) -> Result<Feature<'b>, InvalidFlatbuffer> {
    flatbuffers::size_prefixed_root_with_opts::<Feature<'b>>(opts, buf)
}

/// Root table of a size prefixed `Feature` buffer, without verification.
///
/// # Safety
/// `buf` must hold a feature that already passed
/// [`size_prefixed_root_as_feature_with_opts`].
#[inline]
pub unsafe fn size_prefixed_root_as_feature_unchecked(buf: &[u8]) -> Feature<'_> {
    flatbuffers::size_prefixed_root_unchecked::<Feature>(buf)
}
