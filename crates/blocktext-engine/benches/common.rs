// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_document(blocks: usize) -> blocktext_engine::FormattedText {
    use blocktext_engine::{BlockType, FormattedBlock};
    let mut out = Vec::with_capacity(blocks);
    for i in 0..blocks {
        let block = match i % 5 {
            0 => FormattedBlock::of(BlockType::H2, &format!("Section {i}")),
            1 | 2 => FormattedBlock::of(
                BlockType::Para,
                "Paragraph with some content spanning a couple of clauses.",
            ),
            3 => FormattedBlock::of(BlockType::Olist, &format!("Ordered item {i}")),
            _ => FormattedBlock::of(BlockType::Nlist, "Bullet point\nwith a second line"),
        };
        out.push(block);
    }
    blocktext_engine::FormattedText::of(out)
}
