//! Benchmarks for the C++ front-end and graph assembly

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ontograph_cpp::{CppFrontend, ExtractConfig, Frontend, GraphAssembler, OntologyBuilder};
use std::path::{Path, PathBuf};

const HEADER: &str = r#"
#include <vector>
#include <string>

namespace inventory {

using Name = std::string;

class Item {
public:
    Item(const Name& name, int quantity);
    virtual ~Item() = default;
    virtual double price() const = 0;
    const Name& name() const;
    int quantity() const;

protected:
    Name name_;
    int quantity_;
};

class Tool : public Item {
public:
    Tool(const Name& name, int quantity, double unit);
    double price() const override;

private:
    double unit_;
};

class Warehouse {
public:
    void store(Item* item);
    void store(Item* item, int shelf);
    double value() const;

private:
    std::vector<Item*> items_;
};

} // namespace inventory
"#;

const SOURCE: &str = r#"
#include "inventory.h"

namespace inventory {

Item::Item(const Name& name, int quantity) : name_(name), quantity_(quantity) {}

const Name& Item::name() const { return name_; }

int Item::quantity() const { return quantity_; }

Tool::Tool(const Name& name, int quantity, double unit) : Item(name, quantity), unit_(unit) {}

double Tool::price() const { return unit_ * quantity(); }

void Warehouse::store(Item* item) {
    items_.push_back(item);
}

void Warehouse::store(Item* item, int shelf) {
    store(item);
}

double Warehouse::value() const {
    double total = 0;
    for (Item* item : items_) {
        total += item->price();
    }
    return total;
}

} // namespace inventory

int main() {
    inventory::Warehouse warehouse;
    inventory::Tool hammer("hammer", 3, 12.5);
    warehouse.store(&hammer, 1);
    return warehouse.value() > 0 ? 0 : 1;
}
"#;

fn sources() -> Vec<(PathBuf, String)> {
    vec![
        (PathBuf::from("inventory.h"), HEADER.to_string()),
        (PathBuf::from("inventory.cpp"), SOURCE.to_string()),
    ]
}

fn benchmark_parse_source(c: &mut Criterion) {
    let frontend = CppFrontend::new();

    c.bench_function("cpp_parse_source", |b| {
        b.iter(|| {
            frontend
                .parse_source(black_box(SOURCE), Path::new("inventory.cpp"))
                .unwrap()
        })
    });
}

fn benchmark_assemble(c: &mut Criterion) {
    let frontend = CppFrontend::new();
    let header = frontend
        .parse_source(HEADER, Path::new("inventory.h"))
        .unwrap();
    let source = frontend
        .parse_source(SOURCE, Path::new("inventory.cpp"))
        .unwrap();

    c.bench_function("cpp_assemble_units", |b| {
        b.iter(|| {
            let mut assembler = GraphAssembler::new();
            assembler.merge_unit(black_box(&header)).unwrap();
            assembler.merge_unit(black_box(&source)).unwrap();
            assembler.finish().unwrap()
        })
    });
}

fn benchmark_build(c: &mut Criterion) {
    let inputs = sources();
    let sequential = OntologyBuilder::with_config(ExtractConfig::default().with_parallel(false));

    c.bench_function("cpp_build_sequential", |b| {
        b.iter(|| sequential.build_sources(black_box(&inputs)).unwrap())
    });
}

criterion_group!(benches, benchmark_parse_source, benchmark_assemble, benchmark_build);
criterion_main!(benches);
