use std::fmt;

/// Binary layout of a COM `GUID` (`REFIID` / `REFCLSID` point at one of these).
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn from_u128(uuid: u128) -> Guid {
        Guid {
            data1: (uuid >> 96) as u32,
            data2: (uuid >> 80) as u16,
            data3: (uuid >> 64) as u16,
            data4: (uuid as u64).to_be_bytes(),
        }
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1]
        )?;
        for b in &self.data4[2..] {
            write!(f, "{:02X}", b)?;
        }
        write!(f, "}}")
    }
}

pub const IID_IUNKNOWN: Guid = Guid::from_u128(0x00000000_0000_0000_c000_000000000046);

pub const CLSID_CLR_META_HOST: Guid = Guid::from_u128(0x9280188d_0e8e_4867_b30c_7fa83884e8de);
pub const IID_ICLR_META_HOST: Guid = Guid::from_u128(0xd332db9e_b9b3_4125_8207_a14884f53216);
pub const IID_ICLR_RUNTIME_INFO: Guid = Guid::from_u128(0xbd39d1d2_ba2f_486a_89b0_b4b0cb466891);

pub const CLSID_COR_RUNTIME_HOST: Guid = Guid::from_u128(0xcb2f6723_ab3a_11d2_9c40_00c04fa30a3e);
pub const IID_ICOR_RUNTIME_HOST: Guid = Guid::from_u128(0xcb2f6722_ab3a_11d2_9c40_00c04fa30a3e);

pub const IID_APP_DOMAIN: Guid = Guid::from_u128(0x05f696dc_2b29_3663_ad8b_c4389cf2a713);
pub const IID_ASSEMBLY: Guid = Guid::from_u128(0x17156360_2f1a_384a_bc52_fde93c215c5b);
pub const IID_METHOD_INFO: Guid = Guid::from_u128(0xffcc1b5d_ecb8_38dd_9b01_3dc8abc2aa5f);
