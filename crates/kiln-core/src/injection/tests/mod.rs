mod injector_tests;
mod resolver_tests;
