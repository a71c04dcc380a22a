fn main() {
    periodic_para_lib::run()
}
