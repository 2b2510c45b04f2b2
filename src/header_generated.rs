//! `Header` and `Column` tables of the FlatGeobuf schema (`header.fbs`), in the shape
//! flatc generates. Only the fields read by this crate have accessors.

use flatbuffers::{
    Follow, ForwardsUOffset, InvalidFlatbuffer, Table, VOffsetT, Vector, Verifiable, Verifier,
    VerifierOptions,
};

#[derive(Copy, Clone, PartialEq)]
pub struct Column<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Column<'a> {
    type Inner = Column<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Column<'a> {
    pub const VT_NAME: VOffsetT = 4;
    pub const VT_TYPE_: VOffsetT = 6;

    /// Required by the schema, so present in every verified column.
    #[inline]
    pub fn name(&self) -> &'a str {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Column::VT_NAME, None) }
            .unwrap_or_default()
    }

    #[inline]
    pub fn type_(&self) -> u8 {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<u8>(Column::VT_TYPE_, Some(0)) }.unwrap_or(0)
    }
}

impl Verifiable for Column<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, true)?
            .visit_field::<u8>("type_", Self::VT_TYPE_, false)?
            .finish();
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq)]
pub struct Header<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Header<'a> {
    type Inner = Header<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Header<'a> {
    pub const VT_NAME: VOffsetT = 4;
    pub const VT_GEOMETRY_TYPE: VOffsetT = 8;
    pub const VT_HAS_Z: VOffsetT = 10;
    pub const VT_HAS_M: VOffsetT = 12;
    pub const VT_COLUMNS: VOffsetT = 18;
    pub const VT_FEATURES_COUNT: VOffsetT = 20;
    pub const VT_INDEX_NODE_SIZE: VOffsetT = 22;

    #[inline]
    pub fn name(&self) -> Option<&'a str> {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Header::VT_NAME, None) }
    }

    #[inline]
    pub fn geometry_type(&self) -> u8 {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<u8>(Header::VT_GEOMETRY_TYPE, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn has_z(&self) -> bool {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<bool>(Header::VT_HAS_Z, Some(false)) }.unwrap_or(false)
    }

    #[inline]
    pub fn has_m(&self) -> bool {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<bool>(Header::VT_HAS_M, Some(false)) }.unwrap_or(false)
    }

    #[inline]
    pub fn columns(&self) -> Option<Vector<'a, ForwardsUOffset<Column<'a>>>> {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Column>>>>(
                    Header::VT_COLUMNS,
                    None,
                )
        }
    }

    #[inline]
    pub fn features_count(&self) -> u64 {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<u64>(Header::VT_FEATURES_COUNT, Some(0)) }.unwrap_or(0)
    }

    /// Schema default is 16. Writers store 0 for files without spatial index.
    #[inline]
    pub fn index_node_size(&self) -> u16 {
        // Safety:
        // Created from valid Table for this object
        // which contains a valid value in this slot
        unsafe { self._tab.get::<u16>(Header::VT_INDEX_NODE_SIZE, Some(16)) }.unwrap_or(16)
    }
}

impl Verifiable for Header<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .visit_field::<u8>("geometry_type", Self::VT_GEOMETRY_TYPE, false)?
            .visit_field::<bool>("has_z", Self::VT_HAS_Z, false)?
            .visit_field::<bool>("has_m", Self::VT_HAS_M, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Column>>>>(
                "columns",
                Self::VT_COLUMNS,
                false,
            )?
            .visit_field::<u64>("features_count", Self::VT_FEATURES_COUNT, false)?
            .visit_field::<u16>("index_node_size", Self::VT_INDEX_NODE_SIZE, false)?
            .finish();
        Ok(())
    }
}

/// Verifies a size prefixed `Header` buffer and returns its root table.
#[inline]
pub fn size_prefixed_root_as_header_with_opts<'b, 'o>(
    opts: &'o VerifierOptions,
    buf: &'b [u8],
) -> Result<Header<'b>, InvalidFlatbuffer> {
    flatbuffers::size_prefixed_root_with_opts::<Header<'b>>(opts, buf)
}
