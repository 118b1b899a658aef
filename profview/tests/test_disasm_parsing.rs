use profview::disasm::{event_window, inline_rows, parse_disassembly, AddressIndex, DisasmEvent, MixedRow, ParseMode};

/// `objdump -dS -C -l` output for a tiny m68k program
const GNU_MIXED: &str = "\
game.elf:     file format elf32-m68k


Disassembly of section .text:

00001000 <main>:
main():
/home/dev/game/src/main.c:10
int main(void) {
    1000:\t4e56 0000      \tlinkw %fp,#0
/home/dev/game/src/main.c:11
    int lives = 3;
    1004:\t7003           \tmoveq #3,%d0
    1006:\t2d40 fffc      \tmovel %d0,%fp@(-4)
/home/dev/game/src/main.c:12
    return lives;
    100a:\t202e fffc      \tmovel %fp@(-4),%d0
    100e:\t4e5e           \tunlk %fp
    1010:\t4e75           \trts
";

#[test]
fn test_gnu_mixed_output_builds_index_and_stream() {
    let disasm = parse_disassembly(GNU_MIXED, ParseMode::Elf);

    assert!(disasm.mixed_candidate);
    assert_eq!(disasm.table.len(), 6);
    let rec = &disasm.table[&0x1006];
    assert_eq!(rec.file.as_deref(), Some("/home/dev/game/src/main.c"));
    assert_eq!(rec.line, Some(11));
    assert_eq!(disasm.table[&0x1010].line, Some(12));

    let insns = disasm.events.iter().filter(|e| e.address().is_some()).count();
    assert_eq!(insns, 6);
    assert!(disasm.events.iter().any(|e| matches!(
        e,
        DisasmEvent::Source { text, line: Some(11), .. } if text == "int lives = 3;"
    )));
}

#[test]
fn test_slice_and_mixed_window_around_sample() {
    let disasm = parse_disassembly(GNU_MIXED, ParseMode::Elf);
    let index = AddressIndex::new(disasm.table.clone());

    let window = index.slice(0x1008, 1);
    let addrs: Vec<&str> = window.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(addrs, vec!["0x001004", "0x001006", "0x00100a"]);
    assert!(window[1].is_pc);

    let events = event_window(&disasm.events, 0x1006, 60).unwrap();
    let rows = inline_rows(events, 0x1006);
    let pcs: Vec<&MixedRow> =
        rows.iter().filter(|r| matches!(r, MixedRow::Insn { is_pc: true, .. })).collect();
    assert_eq!(pcs.len(), 1);
    assert!(event_window(&disasm.events, 0x1008, 60).is_none());
}

#[test]
fn test_rom_output() {
    let out = "\
game.rom:     file format binary


Disassembly of section .data:

00c00000 <.data>:
  c00000:\t0010 f300      \torib #0,%a0@
  c00004:\t4ef9 00c0 0402 \tjmp 0xc00402
";
    let disasm = parse_disassembly(out, ParseMode::Rom);
    assert!(!disasm.mixed_candidate);
    assert_eq!(disasm.table.len(), 2);
    assert_eq!(disasm.table[&0xc0_0004].text, "4ef9 00c0 0402 \tjmp 0xc00402");
}
