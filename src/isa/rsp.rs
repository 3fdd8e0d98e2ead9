//! RSP (Reality Signal Processor) instruction decoding.
//!
//! The RSP core is a MIPS scalar pipeline with no 64-bit integer support,
//! no multiply/divide unit, no likely branches, and no FPU, joined to a
//! vector unit reached through COP2: computational ops (`vmulf` … `vnop`)
//! and the dedicated vector load/store formats under the LWC2/SWC2
//! opcodes.
//!
//! A few encodings that cannot execute on the RSP still decode to named
//! identities (`lwc1`, `swc1`, `cache`, `cfc0`, `ctc0`) so the microcode
//! classifier can reject them the same way the CPU classifier rejects
//! N64-unused CPU opcodes.

use super::{funct_field, op_field, rd_field, rs_field, rt_field, sa_field};

/// Unique identity of a decoded RSP instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RspOpcode {
    /// Undecodable word (unknown opcode or reserved bits set).
    Invalid,
    /// The all-zero word.
    Nop,

    // Scalar SPECIAL
    Sll, Srl, Sra, Sllv, Srlv, Srav,
    Jr, Jalr, Break,
    Add, Addu, Sub, Subu, And, Or, Xor, Nor, Slt, Sltu,

    // REGIMM
    Bltz, Bgez, Bltzal, Bgezal,

    // Jumps, branches, immediate arithmetic
    J, Jal, B, Beq, Bne, Blez, Bgtz,
    Addi, Addiu, Slti, Sltiu, Andi, Ori, Xori, Lui,

    // Scalar loads and stores
    Lb, Lh, Lw, Lbu, Lhu,
    Sb, Sh, Sw,

    // COP0 moves (SP and DP command registers)
    Mfc0, Mtc0,

    // COP2 element moves
    Mfc2, Cfc2, Mtc2, Ctc2,

    // Vector computational
    Vmulf, Vmulu, Vrndp, Vmulq, Vmudl, Vmudm, Vmudn, Vmudh,
    Vmacf, Vmacu, Vrndn, Vmacq, Vmadl, Vmadm, Vmadn, Vmadh,
    Vadd, Vsub, Vabs, Vaddc, Vsubc, Vsar,
    Vlt, Veq, Vne, Vge, Vcl, Vch, Vcr, Vmrg,
    Vand, Vnand, Vor, Vnor, Vxor, Vnxor,
    Vrcp, Vrcpl, Vrcph, Vmov, Vrsq, Vrsql, Vrsqh, Vnop,

    // Vector loads (LWC2 group)
    Lbv, Lsv, Llv, Ldv, Lqv, Lrv, Lpv, Luv, Lhv, Lfv, Ltv,

    // Vector stores (SWC2 group)
    Sbv, Ssv, Slv, Sdv, Sqv, Srv, Spv, Suv, Shv, Sfv, Swv, Stv,

    // Encodable but nonexistent on the RSP; rejected by the classifier
    Lwc1, Swc1, Cache, Cfc0, Ctc0,
}

/// A decoded RSP instruction: the raw word plus its identity.
#[derive(Debug, Clone, Copy)]
pub struct RspInstruction {
    word: u32,
    id: RspOpcode,
}

/// Decode a 32-bit word as an RSP instruction.
pub fn decode(word: u32) -> RspInstruction {
    RspInstruction {
        word,
        id: decode_id(word),
    }
}

impl RspInstruction {
    /// The raw instruction word.
    pub fn word(&self) -> u32 {
        self.word
    }

    /// The decoded identity.
    pub fn id(&self) -> RspOpcode {
        self.id
    }

    /// Whether the word decoded to a known, well-formed encoding.
    pub fn is_well_formed(&self) -> bool {
        self.id != RspOpcode::Invalid
    }

    /// GPR source register index.
    pub fn rs(&self) -> u32 {
        rs_field(self.word)
    }

    /// GPR target register index.
    pub fn rt(&self) -> u32 {
        rt_field(self.word)
    }

    /// GPR destination register index.
    pub fn rd(&self) -> u32 {
        rd_field(self.word)
    }

    /// COP0 register index of `mtc0`/`mfc0` (the rd bit position).
    pub fn cop0_rd(&self) -> u32 {
        rd_field(self.word)
    }

    /// Whether this instruction writes the GPR named by `rd`.
    pub fn modifies_rd(&self) -> bool {
        use RspOpcode::*;
        matches!(
            self.id,
            Sll | Srl | Sra | Sllv | Srlv | Srav | Jalr
                | Add | Addu | Sub | Subu | And | Or | Xor | Nor | Slt | Sltu
        )
    }

    /// Whether this instruction writes the GPR named by `rt`.
    pub fn modifies_rt(&self) -> bool {
        use RspOpcode::*;
        matches!(
            self.id,
            Addi | Addiu | Slti | Sltiu | Andi | Ori | Xori | Lui
                | Lb | Lh | Lw | Lbu | Lhu
                | Mfc0 | Mfc2 | Cfc2
        )
    }

    /// Whether this instruction reads DMEM (scalar or vector form).
    pub fn does_load(&self) -> bool {
        use RspOpcode::*;
        matches!(
            self.id,
            Lb | Lh | Lw | Lbu | Lhu
                | Lbv | Lsv | Llv | Ldv | Lqv | Lrv | Lpv | Luv | Lhv | Lfv | Ltv
        )
    }

    /// Whether this instruction writes DMEM (scalar or vector form).
    pub fn does_store(&self) -> bool {
        use RspOpcode::*;
        matches!(
            self.id,
            Sb | Sh | Sw
                | Sbv | Ssv | Slv | Sdv | Sqv | Srv | Spv | Suv | Shv | Sfv | Swv | Stv
        )
    }
}

// =============================================================================
// Decode tables
// =============================================================================

fn decode_id(word: u32) -> RspOpcode {
    use RspOpcode::*;

    if word == 0 {
        return Nop;
    }

    let rs = rs_field(word);
    let rt = rt_field(word);

    match op_field(word) {
        0x00 => decode_special(word),
        0x01 => match rt {
            0x00 => Bltz,
            0x01 => Bgez,
            0x10 => Bltzal,
            0x11 => Bgezal,
            _ => Invalid,
        },
        0x02 => J,
        0x03 => Jal,
        0x04 => {
            if rs == 0 && rt == 0 {
                B
            } else {
                Beq
            }
        }
        0x05 => Bne,
        0x06 if rt == 0 => Blez,
        0x07 if rt == 0 => Bgtz,
        0x08 => Addi,
        0x09 => Addiu,
        0x0A => Slti,
        0x0B => Sltiu,
        0x0C => Andi,
        0x0D => Ori,
        0x0E => Xori,
        0x0F if rs == 0 => Lui,
        0x10 => decode_cop0(word),
        0x12 => decode_cop2(word),
        0x20 => Lb,
        0x21 => Lh,
        0x23 => Lw,
        0x24 => Lbu,
        0x25 => Lhu,
        0x28 => Sb,
        0x29 => Sh,
        0x2B => Sw,
        0x2F => Cache,
        0x31 => Lwc1,
        0x32 => decode_lwc2(word),
        0x39 => Swc1,
        0x3A => decode_swc2(word),
        _ => Invalid,
    }
}

fn decode_special(word: u32) -> RspOpcode {
    use RspOpcode::*;

    let rs = rs_field(word);
    let rt = rt_field(word);
    let rd = rd_field(word);
    let sa = sa_field(word);

    match funct_field(word) {
        0x00 if rs == 0 => Sll,
        0x02 if rs == 0 => Srl,
        0x03 if rs == 0 => Sra,
        0x04 if sa == 0 => Sllv,
        0x06 if sa == 0 => Srlv,
        0x07 if sa == 0 => Srav,
        0x08 if rt == 0 && rd == 0 && sa == 0 => Jr,
        0x09 if rt == 0 && sa == 0 => Jalr,
        0x0D => Break,
        0x20 if sa == 0 => Add,
        0x21 if sa == 0 => Addu,
        0x22 if sa == 0 => Sub,
        0x23 if sa == 0 => Subu,
        0x24 if sa == 0 => And,
        0x25 if sa == 0 => Or,
        0x26 if sa == 0 => Xor,
        0x27 if sa == 0 => Nor,
        0x2A if sa == 0 => Slt,
        0x2B if sa == 0 => Sltu,
        _ => Invalid,
    }
}

fn decode_cop0(word: u32) -> RspOpcode {
    use RspOpcode::*;

    // Move group only; sa and funct must be zero.
    if word & 0x7FF != 0 {
        return Invalid;
    }
    match rs_field(word) {
        0x00 => Mfc0,
        0x02 => Cfc0,
        0x04 => Mtc0,
        0x06 => Ctc0,
        _ => Invalid,
    }
}

fn decode_cop2(word: u32) -> RspOpcode {
    use RspOpcode::*;

    let rs = rs_field(word);

    // Bit 25 set selects the vector computational format.
    if rs & 0x10 != 0 {
        return match funct_field(word) {
            0x00 => Vmulf,
            0x01 => Vmulu,
            0x02 => Vrndp,
            0x03 => Vmulq,
            0x04 => Vmudl,
            0x05 => Vmudm,
            0x06 => Vmudn,
            0x07 => Vmudh,
            0x08 => Vmacf,
            0x09 => Vmacu,
            0x0A => Vrndn,
            0x0B => Vmacq,
            0x0C => Vmadl,
            0x0D => Vmadm,
            0x0E => Vmadn,
            0x0F => Vmadh,
            0x10 => Vadd,
            0x11 => Vsub,
            0x13 => Vabs,
            0x14 => Vaddc,
            0x15 => Vsubc,
            0x1D => Vsar,
            0x20 => Vlt,
            0x21 => Veq,
            0x22 => Vne,
            0x23 => Vge,
            0x24 => Vcl,
            0x25 => Vch,
            0x26 => Vcr,
            0x27 => Vmrg,
            0x28 => Vand,
            0x29 => Vnand,
            0x2A => Vor,
            0x2B => Vnor,
            0x2C => Vxor,
            0x2D => Vnxor,
            0x30 => Vrcp,
            0x31 => Vrcpl,
            0x32 => Vrcph,
            0x33 => Vmov,
            0x34 => Vrsq,
            0x35 => Vrsql,
            0x36 => Vrsqh,
            0x37 => Vnop,
            _ => Invalid,
        };
    }

    // Element moves between the scalar unit and the vector file.
    match rs {
        0x00 => Mfc2,
        0x02 => Cfc2,
        0x04 => Mtc2,
        0x06 => Ctc2,
        _ => Invalid,
    }
}

fn decode_lwc2(word: u32) -> RspOpcode {
    use RspOpcode::*;

    match rd_field(word) {
        0x00 => Lbv,
        0x01 => Lsv,
        0x02 => Llv,
        0x03 => Ldv,
        0x04 => Lqv,
        0x05 => Lrv,
        0x06 => Lpv,
        0x07 => Luv,
        0x08 => Lhv,
        0x09 => Lfv,
        0x0B => Ltv,
        _ => Invalid,
    }
}

fn decode_swc2(word: u32) -> RspOpcode {
    use RspOpcode::*;

    match rd_field(word) {
        0x00 => Sbv,
        0x01 => Ssv,
        0x02 => Slv,
        0x03 => Sdv,
        0x04 => Sqv,
        0x05 => Srv,
        0x06 => Spv,
        0x07 => Suv,
        0x08 => Shv,
        0x09 => Sfv,
        0x0A => Swv,
        0x0B => Stv,
        _ => Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_subset() {
        // addiu $t0, $zero, 64
        assert_eq!(decode(0x2408_0040).id(), RspOpcode::Addiu);
        // jr $ra
        assert_eq!(decode(0x03E0_0008).id(), RspOpcode::Jr);
        // nop
        assert_eq!(decode(0x0000_0000).id(), RspOpcode::Nop);
    }

    #[test]
    fn test_no_64_bit_or_muldiv() {
        // daddiu (0x19) is not an RSP opcode
        assert_eq!(decode(0x6408_0040).id(), RspOpcode::Invalid);
        // mult $a0, $a1
        assert_eq!(decode(0x0085_0018).id(), RspOpcode::Invalid);
        // ld $t0, 0($a0)
        assert_eq!(decode(0xDC88_0000).id(), RspOpcode::Invalid);
    }

    #[test]
    fn test_no_likely_branches() {
        // beql $a0, $zero, +4
        assert_eq!(decode(0x5080_0001).id(), RspOpcode::Invalid);
    }

    #[test]
    fn test_vector_computational() {
        // vmulf $v1, $v2, $v3 (funct 0, bit 25 set)
        let word = (0x12 << 26) | (0x10 << 21) | (3 << 16) | (2 << 11) | (1 << 6);
        assert_eq!(decode(word).id(), RspOpcode::Vmulf);
        // vnop
        let word = (0x12 << 26) | (0x10 << 21) | 0x37;
        assert_eq!(decode(word).id(), RspOpcode::Vnop);
        // funct 0x12 has no vector op assigned
        let word = (0x12 << 26) | (0x10 << 21) | 0x12;
        assert_eq!(decode(word).id(), RspOpcode::Invalid);
    }

    #[test]
    fn test_vector_load_store() {
        // lqv $v4[0], 0($a0)
        let lqv = (0x32 << 26) | (4 << 21) | (4 << 16) | (0x04 << 11);
        let instr = decode(lqv);
        assert_eq!(instr.id(), RspOpcode::Lqv);
        assert!(instr.does_load());
        assert!(!instr.modifies_rt());
        // sqv $v4[0], 0($a0)
        let sqv = (0x3A << 26) | (4 << 21) | (4 << 16) | (0x04 << 11);
        assert!(decode(sqv).does_store());
        // swv exists only in the store group
        let swv = (0x3A << 26) | (0x0A << 11);
        assert_eq!(decode(swv).id(), RspOpcode::Swv);
        let lwv = (0x32 << 26) | (0x0A << 11);
        assert_eq!(decode(lwv).id(), RspOpcode::Invalid);
    }

    #[test]
    fn test_cop0_moves() {
        // mfc0 $t0, SP_STATUS ($4)
        let word = (0x10 << 26) | (8 << 16) | (4 << 11);
        assert_eq!(decode(word).id(), RspOpcode::Mfc0);
        // cop0 register 20 still decodes; validity decides the range
        let word = (0x10 << 26) | (8 << 16) | (20 << 11);
        assert_eq!(decode(word).id(), RspOpcode::Mfc0);
        assert_eq!(decode(word).cop0_rd(), 20);
    }

    #[test]
    fn test_nonexistent_but_decodable() {
        // lwc1 $f4, 0($a0)
        assert_eq!(decode(0xC484_0000).id(), RspOpcode::Lwc1);
        // cache 0, 0($a0)
        assert_eq!(decode(0xBC80_0000).id(), RspOpcode::Cache);
        // ctc0 $t0, $0
        assert_eq!(decode(0x40C8_0000).id(), RspOpcode::Ctc0);
    }
}
