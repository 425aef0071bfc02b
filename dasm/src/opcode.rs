//! # Opcodes and the C28x mnemonic catalog
//!
//! An [`Opcode`] is a stable numeric identifier. It never depends on the
//! position of a mnemonic in some list: every id below is written out
//! explicitly, and ids are only ever appended. Zero is reserved for
//! "unknown".
//!
//! The catalog only names instructions. How each one is encoded (mask,
//! value, length, operand fields) comes from an external opcode table, see
//! [`table`](crate::table).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Bumped whenever ids are appended to [`C28X_MNEMONICS`].
pub const CATALOG_VERSION: u32 = 1;

/// Mnemonic used when an opcode is not known to a registry or catalog.
pub const UNKNOWN_MNEMONIC: &str = "UNKNOWN";

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opcode(u16);

impl Opcode {
    /// Reserved for unrecognized instructions, never assigned to a mnemonic.
    pub const UNKNOWN: Self = Self(0);

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for Opcode {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mnemonic for a catalog id, if the catalog knows it.
pub fn mnemonic(opcode: Opcode) -> Option<&'static str> {
    C28X_MNEMONICS
        .iter()
        .find(|(id, _)| *id == opcode.id())
        .map(|(_, name)| *name)
}

/// Catalog id of a mnemonic. Case-sensitive.
pub fn opcode_of(name: &str) -> Option<Opcode> {
    C28X_MNEMONICS
        .iter()
        .find(|(_, mnemonic)| *mnemonic == name)
        .map(|(id, _)| Opcode(*id))
}

/// C28x mnemonics and their stable ids.
pub const C28X_MNEMONICS: &[(u16, &str)] = &[
    (1, "ABORTI"),
    (2, "ABS"),
    (3, "ABSTC"),
    (4, "ADD"),
    (5, "ADDB"),
    (6, "ADDCL"),
    (7, "ADDCU"),
    (8, "ADDL"),
    (9, "ADDU"),
    (10, "ADDUL"),
    (11, "ADRK"),
    (12, "AND"),
    (13, "ANDB"),
    (14, "ASP"),
    (15, "ASR"),
    (16, "ASR64"),
    (17, "ASRL"),
    (18, "B"),
    (19, "BANZ"),
    (20, "BAR"),
    (21, "BF"),
    (22, "C27MAP"),
    (23, "C27OBJ"),
    (24, "C28ADDR"),
    (25, "C28MAP"),
    (26, "C28OBJ"),
    (27, "CLRC"),
    (28, "CMP"),
    (29, "CMP64"),
    (30, "CMPB"),
    (31, "CMPL"),
    (32, "CMPR"),
    (33, "CSB"),
    (34, "DEC"),
    (35, "DMAC"),
    (36, "DMOV"),
    (37, "EALLOW"),
    (38, "EDIS"),
    (39, "ESTOP0"),
    (40, "ESTOP1"),
    (41, "FFC"),
    (42, "FLIP"),
    (43, "IACK"),
    (44, "IDLE"),
    (45, "IMACL"),
    (46, "IMPYAL"),
    (47, "IMPYL"),
    (48, "IMPYSL"),
    (49, "IMPYXUL"),
    (50, "IN"),
    (51, "INC"),
    (52, "INTR"),
    (53, "IRET"),
    (54, "LB"),
    (55, "LC"),
    (56, "LCR"),
    (57, "LOOPNZ"),
    (58, "LOOPZ"),
    (59, "LPADDR"),
    (60, "LRET"),
    (61, "LRETE"),
    (62, "LRETR"),
    (63, "LSL"),
    (64, "LSL64"),
    (65, "LSLL"),
    (66, "LSR"),
    (67, "LSR64"),
    (68, "LSRL"),
    (69, "MAC"),
    (70, "MAX"),
    (71, "MAXCUL"),
    (72, "MAXL"),
    (73, "MIN"),
    (74, "MINCUL"),
    (75, "MINL"),
    (76, "MOV"),
    (77, "MOVA"),
    (78, "MOVAD"),
    (79, "MOVB"),
    (80, "MOVDL"),
    (81, "MOVH"),
    (82, "MOVL"),
    (83, "MOVP"),
    (84, "MOVS"),
    (85, "MOVU"),
    (86, "MOVW"),
    (87, "MOVX"),
    (88, "MOVZ"),
    (89, "MPY"),
    (90, "MPYA"),
    (91, "MPYB"),
    (92, "MPYS"),
    (93, "MPYU"),
    (94, "MPYXU"),
    (95, "NASP"),
    (96, "NEG"),
    (97, "NEG64"),
    (98, "NEGTC"),
    (99, "NOP"),
    (100, "NORM"),
    (101, "NORM64"),
    (102, "NOT"),
    (103, "OR"),
    (104, "ORB"),
    (105, "OUT"),
    (106, "POP"),
    (107, "PREAD"),
    (108, "PUSH"),
    (109, "PWRITE"),
    (110, "QMACL"),
    (111, "QMPYAL"),
    (112, "QMPYL"),
    (113, "QMPYSL"),
    (114, "QMPYUL"),
    (115, "QMPYXUL"),
    (116, "ROL"),
    (117, "ROR"),
    (118, "RPT"),
    (119, "SAT"),
    (120, "SAT64"),
    (121, "SB"),
    (122, "SBBU"),
    (123, "SBF"),
    (124, "SBRK"),
    (125, "SETC"),
    (126, "SFR"),
    (127, "SPM"),
    (128, "SQRA"),
    (129, "SQRS"),
    (130, "SUB"),
    (131, "SUBB"),
    (132, "SUBBL"),
    (133, "SUBCU"),
    (134, "SUBCUL"),
    (135, "SUBL"),
    (136, "SUBR"),
    (137, "SUBRL"),
    (138, "SUBU"),
    (139, "SUBUL"),
    (140, "SXTB"),
    (141, "TBIT"),
    (142, "TCLR"),
    (143, "TEST"),
    (144, "TRAP"),
    (145, "TSET"),
    (146, "UOUT"),
    (147, "XB"),
    (148, "XBANZ"),
    (149, "XCALL"),
    (150, "XMAC"),
    (151, "XMACD"),
    (152, "XOR"),
    (153, "XORB"),
    (154, "XPREAD"),
    (155, "XPWRITE"),
    (156, "XRET"),
    (157, "XRETC"),
    (158, "ZALR"),
    (159, "ZAP"),
    (160, "ZAPA"),
];
