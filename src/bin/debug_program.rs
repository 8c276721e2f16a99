use rebc::{assembler::disassemble, evaluate, Capture};

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| u8::from_str_radix(&pair.iter().collect::<String>(), 16).ok())
        .collect()
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <hex bytecode> <input> [slots]", args[0]);
        std::process::exit(2);
    }

    let Some(program) = parse_hex(&args[1]) else {
        eprintln!("bytecode must be pairs of hex digits");
        std::process::exit(2);
    };
    let input = args[2].as_bytes();
    let slots = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10);

    print!("Bytecode ({} bytes):", program.len());
    for byte in &program {
        print!(" {byte:02x}");
    }
    println!();

    match disassemble(&program) {
        Ok(node) => println!("Pattern: {node}"),
        Err(e) => println!("Pattern: <{e}>"),
    }

    let mut captures = vec![Capture::default(); slots];
    match evaluate(&program, input, 0, 0, &mut captures) {
        Ok(outcome) => {
            println!(
                "Matched: {} (ends at pc {}, consumed {} bytes)",
                outcome.matched,
                outcome.pc,
                outcome.sp
            );
            for index in outcome.groups.groups() {
                let capture = captures[index];
                println!(
                    "  group {index}: {:?} {:?}",
                    capture.range(),
                    String::from_utf8_lossy(capture.slice(input).unwrap_or_default())
                );
            }
        }
        Err(e) => println!("Error: {e}"),
    }
}
