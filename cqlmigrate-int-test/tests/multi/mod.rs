mod multi_migrator_test;
